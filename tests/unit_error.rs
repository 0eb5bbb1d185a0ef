/// Unit tests for DiError and DiResult types

use ioc_ref::{DiError, DiResult, Handle};
use std::error::Error;

#[test]
fn test_error_display_circular() {
    let handle = Handle::new(|_| Ok(0u8));
    let error = DiError::Circular {
        handle: handle.id(),
        path: vec!["ServiceA", "ServiceB", "ServiceA"],
    };
    let display_str = format!("{}", error);

    assert_eq!(
        display_str,
        format!(
            "circular dependency detected: Handle#{} (ServiceA -> ServiceB -> ServiceA)",
            handle.id().as_u64()
        )
    );
    assert!(error.is_circular());
}

#[test]
fn test_error_display_type_mismatch() {
    let error = DiError::TypeMismatch("alloc::string::String");
    assert_eq!(error.to_string(), "type mismatch for: alloc::string::String");
    assert!(!error.is_circular());
}

#[test]
fn test_error_display_depth_exceeded() {
    let error = DiError::DepthExceeded(100);
    let display_str = format!("{}", error);

    assert_eq!(display_str, "max depth 100 exceeded");
    assert!(display_str.contains("100"));
}

#[test]
fn test_factory_error_is_transparent() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config file missing");
    let error = DiError::factory(io);

    assert_eq!(error.to_string(), "config file missing");
    match &error {
        DiError::Factory(inner) => {
            let io = inner.downcast_ref::<std::io::Error>().expect("io error preserved");
            assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("Expected Factory error, got {:?}", other),
    }
}

#[test]
fn test_anyhow_converts_with_question_mark() {
    fn failing() -> DiResult<u32> {
        let parsed: u32 = "not a number".parse().map_err(anyhow::Error::from)?;
        Ok(parsed)
    }

    let error = failing().unwrap_err();
    assert!(matches!(error, DiError::Factory(_)));
    assert!(error.to_string().contains("invalid digit"));
}

#[test]
fn test_error_trait_implementation() {
    let error = DiError::DepthExceeded(3);
    let as_error: &dyn Error = &error;

    assert_eq!(as_error.to_string(), "max depth 3 exceeded");
    assert!(as_error.source().is_none());
}

#[test]
fn test_di_result_type_alias() {
    fn create() -> DiResult<String> {
        Ok("service created".to_string())
    }

    fn fail() -> DiResult<String> {
        Err(DiError::TypeMismatch("String"))
    }

    assert_eq!(create().unwrap(), "service created");
    assert!(matches!(fail(), Err(DiError::TypeMismatch("String"))));
}
