use rsa_envelope::*;
use std::sync::OnceLock;

fn key_pair() -> &'static KeyPair {
    static KEY_PAIR: OnceLock<KeyPair> = OnceLock::new();
    KEY_PAIR.get_or_init(|| asymmetric::generate_key_pair(2048).unwrap())
}

fn other_key_pair() -> &'static KeyPair {
    static KEY_PAIR: OnceLock<KeyPair> = OnceLock::new();
    KEY_PAIR.get_or_init(|| asymmetric::generate_key_pair(2048).unwrap())
}

#[test]
fn symmetric_hello_world() {
    let result = symmetric::encrypt("hello world".as_bytes(), None).unwrap();
    let key = result.key().unwrap().to_vec();
    assert_eq!(
        symmetric::decrypt(&result, Some(key.as_slice())).unwrap(),
        b"hello world"
    );
}

#[test]
fn direct_limit_and_hybrid_megabyte() {
    let kp = key_pair();
    let small = vec![0x42u8; 100];
    let direct = asymmetric::encrypt(&small, kp.public_key()).unwrap();
    assert_eq!(asymmetric::decrypt(&direct, kp.private_key()).unwrap(), small);

    let megabyte: Vec<u8> = (0..1_000_000u32).map(|i| (i * 7 % 256) as u8).collect();
    assert!(matches!(
        asymmetric::encrypt(&megabyte, kp.public_key()),
        Err(Error::PlaintextTooLarge { max: 245, actual: 1_000_000 })
    ));

    let envelope = hybrid::encrypt(&megabyte, kp.public_key()).unwrap();
    assert_eq!(hybrid::decrypt(&envelope, kp.private_key()).unwrap(), megabyte);
}

#[test]
fn sign_transfer() {
    let signed = asymmetric::sign(b"transfer:100", key_pair().private_key()).unwrap();
    assert!(asymmetric::verify(&signed, key_pair().public_key()));
    assert!(!asymmetric::verify(&signed, other_key_pair().public_key()));
}

#[test]
fn envelope_through_text() {
    let kp = key_pair();
    let plaintext = b"an envelope that travels as text".repeat(100);
    let text = codec::to_text(&hybrid::encrypt(&plaintext, kp.public_key()).unwrap()).unwrap();
    let envelope: HybridResult = codec::from_text(&text).unwrap();
    assert_eq!(hybrid::decrypt(&envelope, kp.private_key()).unwrap(), plaintext);
}

#[test]
fn corrupted_text_is_a_format_error() {
    let kp = key_pair();
    let text = hybrid::encrypt(b"payload", kp.public_key())
        .unwrap()
        .to_text()
        .unwrap();
    let truncated = &text[..text.len() - 10];
    assert!(matches!(
        HybridResult::from_text(truncated),
        Err(Error::Format(_))
    ));

    let corrupted = text.replacen("\"payload\"", "\"pay1oad\"", 1);
    assert!(matches!(
        HybridResult::from_text(&corrupted),
        Err(Error::Format(_))
    ));
}

#[test]
fn keys_travel_as_text() {
    let kp = key_pair();
    let public = PublicKey::from_pem(&kp.public_key().to_pem().unwrap()).unwrap();
    let private = PrivateKey::from_pem(&kp.private_key().to_pem().unwrap()).unwrap();

    let envelope = hybrid::encrypt(b"sent with a parsed key", &public).unwrap();
    assert_eq!(
        hybrid::decrypt(&envelope, &private).unwrap(),
        b"sent with a parsed key"
    );

    let restored = KeyPair::from_text(&kp.to_text().unwrap()).unwrap();
    assert_eq!(&restored, kp);
}

#[test]
fn larger_key_sizes() {
    let kp = asymmetric::generate_key_pair_with_size(KeySize::Rsa3072).unwrap();
    assert_eq!(kp.key_size(), KeySize::Rsa3072);
    assert_eq!(asymmetric::max_plaintext_len(kp.public_key()), 373);

    let envelope = hybrid::encrypt(b"three thousand", kp.public_key()).unwrap();
    assert_eq!(envelope.encrypted_key().ciphertext().len(), 384);
    assert_eq!(envelope.decrypt(kp.private_key()).unwrap(), b"three thousand");
}

#[test]
fn concurrent_calls_are_independent() {
    let kp = key_pair();
    let handles: Vec<_> = (0..4u8)
        .map(|i| {
            std::thread::spawn(move || {
                let data = vec![i; 10_000];
                let envelope = hybrid::encrypt(&data, kp.public_key()).unwrap();
                (data, envelope)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (data, envelope) in &results {
        assert_eq!(&hybrid::decrypt(envelope, kp.private_key()).unwrap(), data);
    }
    assert_ne!(results[0].1.payload().iv(), results[1].1.payload().iv());
}
