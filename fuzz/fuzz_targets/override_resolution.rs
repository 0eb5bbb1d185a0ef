#![no_main]

use ioc_ref::{Handle, RegisterOptions, Registry};
use libfuzzer_sys::fuzz_target;

const MAX_BASES: usize = 8;

// Bases resolve to their index. Each input byte registers one consumer: the low three bits pick
// the base it reads, the next three pick the base its override replaces, and the high bit says
// whether it installs an override at all.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let bases: Vec<Handle<usize>> = (0..MAX_BASES).map(|i| Handle::new(move |_| Ok(i))).collect();
    let registry = Registry::new();

    for &byte in data.iter().take(64) {
        let read = usize::from(byte & 0b111);
        let replaced = usize::from((byte >> 3) & 0b111);
        let overridden = byte & 0x80 != 0;

        let substitute = Handle::with_options(
            move |_| Ok(100 + replaced),
            RegisterOptions::new().overrides(&bases[replaced]),
        );
        let consumer = {
            let base = bases[read].clone();
            let options = if overridden {
                RegisterOptions::new().with_override(&substitute).standalone()
            } else {
                RegisterOptions::new().standalone()
            };
            Handle::with_options(move |scope| Ok(*scope.resolve(&base)?), options)
        };

        let expected = if overridden && read == replaced { 100 + replaced } else { read };
        let seen = registry
            .with_root_scope(|scope| scope.resolve(&consumer))
            .expect("override graphs are acyclic");
        assert_eq!(*seen, expected);

        // Overrides never leak into the global store.
        let base = registry
            .with_root_scope(|scope| scope.resolve(&bases[read]))
            .expect("base resolves");
        assert_eq!(*base, read);
    }
});
