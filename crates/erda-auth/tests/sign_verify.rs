//! End-to-end signing and verification properties.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use erda_auth::{
    AkSkPair, CredentialProvider, SignAlgorithm, Signer, SignerConfig, StaticCredentialProvider,
    Validator, ValidatorConfig, access_key_id,
};

const TEST_ACCESS_KEY: &str = "IQ9E2Buhd8z2h7njPaxeGxq8";
const TEST_SECRET_KEY: &str = "0O2Hn0TrTrRwrds1q0un0p9AvX4JB8V6";

fn test_pair() -> AkSkPair {
    AkSkPair::new(TEST_ACCESS_KEY, TEST_SECRET_KEY)
}

fn signed_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 5, 16, 0, 0, 0).unwrap()
}

fn collector_request() -> http::request::Parts {
    let (parts, ()) = http::Request::builder()
        .method("POST")
        .uri("http://collector.erda.cloud/collect/metrics?format=json&cluster=dev&cluster=prod")
        .header("x-erda-sdk", "true")
        .header("x-erda-version", "0.1.0")
        .header("content-type", "application/json")
        .body(())
        .unwrap()
        .into_parts();
    parts
}

fn signer(timestamped: bool, in_query: bool) -> Signer {
    let config = SignerConfig {
        timestamp: timestamped.then(signed_at),
        auth_in_query: in_query,
        algorithm: SignAlgorithm::HmacSha1,
    };
    Signer::new(test_pair(), config)
}

fn validator() -> Validator {
    Validator::new(test_pair(), ValidatorConfig::default())
}

fn with_uri(mut parts: http::request::Parts, uri: &str) -> http::request::Parts {
    parts.uri = uri.parse().unwrap();
    parts
}

#[test]
fn test_should_round_trip_in_every_mode() {
    for timestamped in [false, true] {
        for in_query in [false, true] {
            let mut parts = collector_request();
            signer(timestamped, in_query).sign_request(&mut parts).unwrap();

            let result = validator().verify_at(&parts, signed_at() + TimeDelta::seconds(1));
            assert!(
                result.ok,
                "timestamped={timestamped} in_query={in_query}: {}",
                result.message
            );
        }
    }
}

#[test]
fn test_should_round_trip_with_hmac_sha256() {
    let config = SignerConfig::builder()
        .timestamp(signed_at())
        .algorithm(SignAlgorithm::HmacSha256)
        .build();
    let mut parts = collector_request();
    Signer::new(test_pair(), config)
        .sign_request(&mut parts)
        .unwrap();

    let validator_config = ValidatorConfig::builder()
        .algorithm(SignAlgorithm::HmacSha256)
        .build();
    let result = Validator::new(test_pair(), validator_config).verify_at(&parts, signed_at());
    assert!(result.ok, "{}", result.message);

    // A SHA-1 validator does not accept the stronger signature implicitly.
    assert!(!validator().verify_at(&parts, signed_at()).ok);
}

#[test]
fn test_should_be_deterministic() {
    let signer = signer(true, false);
    let parts = collector_request();
    assert_eq!(signer.sign_string(&parts), signer.sign_string(&parts));
    assert_eq!(signer.auth_string(&parts), signer.auth_string(&parts));
}

#[test]
fn test_should_ignore_query_and_header_order() {
    let signer = signer(true, false);

    let (reordered, ()) = http::Request::builder()
        .method("POST")
        .uri("http://collector.erda.cloud/collect/metrics?cluster=prod&format=json&cluster=dev")
        .header("x-erda-version", "0.1.0")
        .header("content-type", "application/json")
        .header("x-erda-sdk", "true")
        .body(())
        .unwrap()
        .into_parts();

    assert_eq!(
        signer.sign_string(&collector_request()),
        signer.sign_string(&reordered)
    );
    assert_eq!(
        signer.auth_string(&collector_request()),
        signer.auth_string(&reordered)
    );
}

#[test]
fn test_should_ignore_ordinary_headers_and_reserved_query_parameters() {
    let signer = signer(true, false);
    let baseline = signer.auth_string(&collector_request());

    let mut parts = collector_request();
    parts
        .headers
        .insert("user-agent", "telegraf/1.20".parse().unwrap());
    parts.headers.remove("content-type");
    assert_eq!(signer.auth_string(&parts), baseline);

    let parts = with_uri(
        collector_request(),
        "http://collector.erda.cloud/collect/metrics?format=json&cluster=dev&cluster=prod&X-Erda-Extra=1",
    );
    assert_eq!(signer.auth_string(&parts), baseline);
}

#[test]
fn test_should_survive_proxy_rewriting_ordinary_headers() {
    let mut parts = collector_request();
    signer(true, false).sign_request(&mut parts).unwrap();

    parts
        .headers
        .insert("x-forwarded-for", "10.0.0.1".parse().unwrap());
    parts
        .headers
        .insert("content-type", "application/json; charset=utf-8".parse().unwrap());

    assert!(validator().verify_at(&parts, signed_at()).ok);
}

#[test]
fn test_should_detect_tampering() {
    let signed = || {
        let mut parts = collector_request();
        signer(true, false).sign_request(&mut parts).unwrap();
        parts
    };

    let mut method = signed();
    method.method = http::Method::PUT;
    assert!(!validator().verify_at(&method, signed_at()).ok);

    let path = with_uri(
        signed(),
        "http://collector.erda.cloud/collect/logs?format=json&cluster=dev&cluster=prod",
    );
    assert!(!validator().verify_at(&path, signed_at()).ok);

    let query = with_uri(
        signed(),
        "http://collector.erda.cloud/collect/metrics?format=json&cluster=dev&cluster=staging",
    );
    assert!(!validator().verify_at(&query, signed_at()).ok);

    let mut header = signed();
    header
        .headers
        .insert("x-erda-version", "0.2.0".parse().unwrap());
    assert!(!validator().verify_at(&header, signed_at()).ok);

    let mut added = signed();
    added.headers.insert("x-erda-org", "erda".parse().unwrap());
    assert!(!validator().verify_at(&added, signed_at()).ok);
}

#[test]
fn test_should_detect_tampered_query_placed_timestamp() {
    let mut parts = collector_request();
    signer(true, true).sign_request(&mut parts).unwrap();

    let uri = parts.uri.to_string().replace(
        "X-Erda-Sign-Timestamp=1621123200",
        "X-Erda-Sign-Timestamp=1621123260",
    );
    let parts = with_uri(parts, &uri);

    assert!(!validator().verify_at(&parts, signed_at()).ok);
}

#[test]
fn test_should_enforce_expiry_window_boundaries() {
    let window = TimeDelta::minutes(10);
    let mut parts = collector_request();
    signer(true, false).sign_request(&mut parts).unwrap();

    let late = validator().verify_at(&parts, signed_at() + window + TimeDelta::seconds(1));
    assert!(!late.ok);
    assert!(late.message.contains("expired"), "{}", late.message);

    let in_time = validator().verify_at(&parts, signed_at() + window - TimeDelta::seconds(1));
    assert!(in_time.ok, "{}", in_time.message);
}

#[test]
fn test_should_not_expire_untimestamped_requests() {
    let mut parts = collector_request();
    signer(false, false).sign_request(&mut parts).unwrap();

    let years_later = signed_at() + TimeDelta::days(3650);
    assert!(validator().verify_at(&parts, years_later).ok);
}

#[test]
fn test_should_reject_wrong_secret() {
    let mut parts = collector_request();
    signer(true, false).sign_request(&mut parts).unwrap();

    let wrong = Validator::new(
        AkSkPair::new(TEST_ACCESS_KEY, "WRONG_SECRET_KEY"),
        ValidatorConfig::default(),
    );
    let result = wrong.verify_at(&parts, signed_at());
    assert!(!result.ok);
    assert!(result.message.contains("signature mismatch"));
}

#[test]
fn test_should_route_to_credentials_via_extracted_access_key() {
    let provider = StaticCredentialProvider::new(vec![
        ("other".to_owned(), "other-secret".to_owned()),
        (TEST_ACCESS_KEY.to_owned(), TEST_SECRET_KEY.to_owned()),
    ]);

    for in_query in [false, true] {
        let mut parts = collector_request();
        signer(true, in_query).sign_request(&mut parts).unwrap();

        let ak = access_key_id(&parts).expect("access key present");
        let pair = provider.get_pair(&ak).unwrap();
        let result = Validator::new(pair, ValidatorConfig::default()).verify_at(&parts, signed_at());
        assert!(result.ok, "in_query={in_query}: {}", result.message);
    }
}

#[test]
fn test_should_share_validator_across_threads() {
    let validator = std::sync::Arc::new(validator());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let validator = std::sync::Arc::clone(&validator);
            std::thread::spawn(move || {
                let mut parts = collector_request();
                signer(i % 2 == 0, i >= 2).sign_request(&mut parts).unwrap();
                validator.verify_at(&parts, signed_at()).ok
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
