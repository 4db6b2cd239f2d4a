use noties_core::{open, seal, CipherError};

const SAMPLES: &[&str] = &[
    "",
    "milk eggs bread",
    "exactly sixteen!",
    "línea uno\nlínea dos\t🦀",
    "a much longer body that spans several AES blocks so padding is exercised on more than one boundary",
];

#[test]
fn open_reverses_seal_for_every_sample() {
    for (index, plaintext) in SAMPLES.iter().enumerate() {
        let passphrase = format!("key-{index}");
        let envelope = seal(plaintext, &passphrase).unwrap();
        assert_eq!(open(&envelope, &passphrase).unwrap(), *plaintext);
    }
}

#[test]
fn envelope_is_opaque_salted_base64() {
    let envelope = seal("milk eggs bread", "k1").unwrap();
    assert!(envelope.starts_with("U2FsdGVkX1"));
    assert!(!envelope.contains("milk"));
}

#[test]
fn wrong_passphrase_is_rejected() {
    // Without an authentication tag a wrong key can occasionally slip past the
    // padding check, so only the overwhelming majority must fail and none may
    // ever yield the original text.
    let plaintext = "milk eggs bread";
    let envelope = seal(plaintext, "k1").unwrap();

    let mut rejected = 0;
    for attempt in 0..32 {
        match open(&envelope, &format!("wrong-{attempt}")) {
            Err(CipherError::WrongKeyOrCorruptData) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
            Ok(garbage) => assert_ne!(garbage, plaintext),
        }
    }
    assert!(rejected >= 24, "only {rejected}/32 wrong keys were rejected");
}

#[test]
fn tampered_envelope_does_not_yield_original_text() {
    let envelope = seal("milk eggs bread", "k1").unwrap();
    let mut tampered = envelope.into_bytes();
    let last_data_char = tampered.len() - 3;
    tampered[last_data_char] = if tampered[last_data_char] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    match open(&tampered, "k1") {
        Err(err) => assert_eq!(err, CipherError::WrongKeyOrCorruptData),
        Ok(garbage) => assert_ne!(garbage, "milk eggs bread"),
    }
}
