use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PaperdollError::config("x")
            .to_string()
            .contains("configuration error:")
    );
    assert!(PaperdollError::decode("x").to_string().contains("decode error:"));
    assert!(
        PaperdollError::estimation("x")
            .to_string()
            .contains("estimation error:")
    );
    assert!(PaperdollError::render("x").to_string().contains("render error:"));
    assert!(
        PaperdollError::session("x")
            .to_string()
            .contains("session error:")
    );
    assert!(
        PaperdollError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn only_config_errors_are_fatal() {
    assert!(PaperdollError::config("bad index").is_fatal());
    assert!(!PaperdollError::decode("bad svg").is_fatal());
    assert!(!PaperdollError::estimation("model threw").is_fatal());
}

#[test]
fn serde_json_errors_convert() {
    let err: PaperdollError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, PaperdollError::Serde(_)));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PaperdollError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
