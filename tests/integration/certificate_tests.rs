//! Certificate issuance and issuer chains

use certdog_client::{
    Certificate, CertdogError, CsrCertificateRequest, DnCertificateRequest, OutputFormat,
    SubjectAltName,
};
use rstest::rstest;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_json, body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::*;

const CERT_ID: &str = "61f2a0c4e3b1";
const P12_DATA: &str = "MIIKSQIBAzCCCg8GCSqGSIb3DQEHAaCCCgAEggn8";
const JKS_DATA: &str = "/u3+7QAAAAIAAAABAAAAAQAIY2VydGRvZw==";

fn dn_request() -> DnCertificateRequest {
    DnCertificateRequest::new(ISSUER, GENERATOR, TEAM, "CN=client pem test").password("password")
}

async fn mount_issue(api_mock: &MockCertdog) {
    Mock::given(method("POST"))
        .and(path(api("certs/request")))
        .and(bearer_token(TOKEN))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": CERT_ID, "p12Data": P12_DATA})),
        )
        .expect(1)
        .mount(&api_mock.server)
        .await;
}

async fn mount_conversion(api_mock: &MockCertdog, format: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(api(&format!("certs/{}/{}", CERT_ID, format))))
        .and(bearer_token(TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(times)
        .mount(&api_mock.server)
        .await;
}

#[tokio::test]
async fn test_pkcs12_request_makes_one_call() {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    mount_issue(&api_mock).await;
    mount_conversion(&api_mock, "jks", JKS_DATA, 0).await;
    mount_conversion(&api_mock, "pem", LEAF_PEM, 0).await;

    let payload = client
        .request_certificate(&dn_request(), OutputFormat::Pkcs12)
        .await
        .unwrap();

    assert_eq!(payload.id, CERT_ID);
    assert_eq!(payload.format, OutputFormat::Pkcs12);
    assert_eq!(payload.data, P12_DATA);
}

#[tokio::test]
async fn test_pem_request_fetches_by_returned_id() {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    mount_issue(&api_mock).await;
    mount_conversion(&api_mock, "pem", LEAF_PEM, 1).await;
    mount_conversion(&api_mock, "jks", JKS_DATA, 0).await;

    let payload = client
        .request_certificate(&dn_request(), OutputFormat::Pem)
        .await
        .unwrap();

    assert_eq!(payload.format, OutputFormat::Pem);
    assert!(payload.data.starts_with("-----BEGIN CERTIFICATE-----"));
    assert_eq!(payload.data, LEAF_PEM);
}

#[tokio::test]
async fn test_jks_request_fetches_by_returned_id() {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    mount_issue(&api_mock).await;
    mount_conversion(&api_mock, "jks", &format!("\"{}\"", JKS_DATA), 1).await;
    mount_conversion(&api_mock, "pem", LEAF_PEM, 0).await;

    let payload = client
        .request_certificate(&dn_request(), OutputFormat::Jks)
        .await
        .unwrap();

    // A JSON string body is unquoted
    assert_eq!(payload.data, JKS_DATA);
    assert_eq!(payload.id, CERT_ID);
}

#[tokio::test]
async fn test_dn_request_body() {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    Mock::given(method("POST"))
        .and(path(api("certs/request")))
        .and(body_json(json!({
            "caName": ISSUER,
            "csrGeneratorName": GENERATOR,
            "teamName": TEAM,
            "dn": "CN=client jks test",
            "p12Password": "password",
            "subjectAltNames": ["DNS:server1.com", "DNS:server2.com", "IP:127.0.0.1", "EMAIL:none@nowhere.com"],
            "extraInfo": "From a test",
            "extraEmails": ["ops@example.com"]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": CERT_ID, "p12Data": P12_DATA})),
        )
        .expect(1)
        .mount(&api_mock.server)
        .await;

    let request = DnCertificateRequest::new(ISSUER, GENERATOR, TEAM, "CN=client jks test")
        .password("password")
        .subject_alt_name(SubjectAltName::Dns("server1.com".to_string()))
        .subject_alt_names(["DNS:server2.com", "IP:127.0.0.1"])
        .subject_alt_name(SubjectAltName::Email("none@nowhere.com".to_string()))
        .extra_info("From a test")
        .extra_email("ops@example.com");

    client
        .request_certificate(&request, OutputFormat::Pkcs12)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_failed_conversion_fails_the_request() {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    mount_issue(&api_mock).await;
    Mock::given(method("GET"))
        .and(path(api(&format!("certs/{}/pem", CERT_ID))))
        .respond_with(ResponseTemplate::new(500).set_body_string("conversion failed"))
        .expect(1)
        .mount(&api_mock.server)
        .await;

    let err = client
        .request_certificate(&dn_request(), OutputFormat::Pem)
        .await
        .unwrap_err();

    match &err {
        CertdogError::CertificateRequest { dn, .. } => assert_eq!(dn, "CN=client pem test"),
        other => panic!("expected CertificateRequest, got {:?}", other),
    }
    assert_eq!(err.api_status().map(|s| s.as_u16()), Some(500));
    assert_eq!(err.api_body(), Some("conversion failed"));
}

#[tokio::test]
async fn test_forbidden_request_carries_dn_and_body() {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    Mock::given(method("POST"))
        .and(path(api("certs/request")))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&api_mock.server)
        .await;

    let err = client
        .request_certificate(&dn_request(), OutputFormat::Pkcs12)
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("CN=client pem test"));
    assert!(message.contains("forbidden"));
    assert_eq!(err.api_body(), Some("forbidden"));
}

#[tokio::test]
async fn test_legacy_cert_id_response_rejected() {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    Mock::given(method("POST"))
        .and(path(api("certs/request")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"certId": CERT_ID, "p12Data": P12_DATA})),
        )
        .expect(1)
        .mount(&api_mock.server)
        .await;
    mount_conversion(&api_mock, "pem", LEAF_PEM, 0).await;

    let err = client
        .request_certificate(&dn_request(), OutputFormat::Pem)
        .await
        .unwrap_err();
    assert!(matches!(err.root(), CertdogError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_invalid_request_rejected_before_sending() {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    let requests_after_login = api_mock.request_count().await;

    let request = DnCertificateRequest::new(ISSUER, GENERATOR, TEAM, "CN=x")
        .subject_alt_names(["server1.com"]);
    let err = client
        .request_certificate(&request, OutputFormat::Pkcs12)
        .await
        .unwrap_err();

    assert!(matches!(err.root(), CertdogError::InvalidInput(_)));
    assert_eq!(api_mock.request_count().await, requests_after_login);
}

#[tokio::test]
async fn test_csr_request_returns_parsed_certificate() {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    Mock::given(method("POST"))
        .and(path(api("certs/requestp10")))
        .and(bearer_token(TOKEN))
        .and(body_partial_json(json!({
            "caName": ISSUER,
            "teamName": TEAM,
            "csr": CSR_PEM,
            "extraInfo": "From a test"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": CERT_ID, "pemCert": LEAF_PEM})),
        )
        .expect(1)
        .mount(&api_mock.server)
        .await;

    let request = CsrCertificateRequest::new(ISSUER, TEAM, CSR_PEM).extra_info("From a test");
    let certificate = client.request_certificate_from_csr(&request).await.unwrap();

    assert!(certificate.subject().contains("client pem test"));
    assert_eq!(certificate.serial_number(), LEAF_SERIAL);
    assert_eq!(certificate, Certificate::from_pem(LEAF_PEM).unwrap());
}

#[tokio::test]
async fn test_csr_request_with_unparseable_certificate() {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    Mock::given(method("POST"))
        .and(path(api("certs/requestp10")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": CERT_ID,
            "pemCert": "-----BEGIN CERTIFICATE-----\nbm90IGEgY2VydA==\n-----END CERTIFICATE-----"
        })))
        .expect(1)
        .mount(&api_mock.server)
        .await;

    let request = CsrCertificateRequest::new(ISSUER, TEAM, CSR_PEM);
    let err = client
        .request_certificate_from_csr(&request)
        .await
        .unwrap_err();

    match &err {
        CertdogError::CsrRequest { issuer, .. } => assert_eq!(issuer, ISSUER),
        other => panic!("expected CsrRequest, got {:?}", other),
    }
    assert!(matches!(err.root(), CertdogError::CertificateFormat(_)));
}

#[tokio::test]
async fn test_issuer_chain_keeps_server_order() {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    Mock::given(method("GET"))
        .and(path(api(&format!("admin/ca/chainbyname/{}", ISSUER))))
        .and(bearer_token(TOKEN))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([INTERMEDIATE_PEM, ROOT_PEM])),
        )
        .expect(1)
        .mount(&api_mock.server)
        .await;

    let chain = client.get_issuer_chain(ISSUER).await.unwrap();

    assert_eq!(chain.len(), 2);
    assert!(chain[0].subject().contains("Test Issuing CA"));
    assert!(chain[1].subject().contains("Test Root CA"));
    assert_eq!(chain[0].issuer(), chain[1].subject());
}

#[tokio::test]
async fn test_issuer_chain_with_bad_entry_fails_entirely() {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    Mock::given(method("GET"))
        .and(path(api(&format!("admin/ca/chainbyname/{}", ISSUER))))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([INTERMEDIATE_PEM, "not a certificate"])),
        )
        .expect(1)
        .mount(&api_mock.server)
        .await;

    let err = client.get_issuer_chain(ISSUER).await.unwrap_err();
    match &err {
        CertdogError::CertificateFormat(detail) => {
            assert!(detail.contains("entry 1"));
            assert!(detail.contains(ISSUER));
        }
        other => panic!("expected CertificateFormat, got {:?}", other),
    }
}

#[rstest]
#[case(OutputFormat::Pem, "pem", "")]
#[case(OutputFormat::Pem, "pem", " \r\n")]
#[case(OutputFormat::Jks, "jks", "")]
#[case(OutputFormat::Jks, "jks", "\"\"")]
#[tokio::test]
async fn test_empty_conversion_body_fails_the_request(
    #[case] format: OutputFormat,
    #[case] suffix: &str,
    #[case] body: &str,
) {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    mount_issue(&api_mock).await;
    mount_conversion(&api_mock, suffix, body, 1).await;

    let err = client
        .request_certificate(&dn_request(), format)
        .await
        .unwrap_err();

    assert!(matches!(err, CertdogError::CertificateRequest { .. }));
    assert!(matches!(err.root(), CertdogError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_payload_save_writes_binary_for_pkcs12() {
    let api_mock = MockCertdog::start().await;
    let client = api_mock.logged_in_client().await;
    mount_issue(&api_mock).await;

    let payload = client
        .request_certificate(&dn_request(), OutputFormat::Pkcs12)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("certdog.pfx");
    payload.save(&target).unwrap();

    let written = std::fs::read(&target).unwrap();
    assert_eq!(written[0], 0x30);
    assert_eq!(
        written,
        certdog_client::utils::pem::decode_base64(P12_DATA).unwrap()
    );
}

#[tokio::test]
async fn test_certificate_save_pem_round_trips() {
    let certificate = Certificate::from_pem(LEAF_PEM).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("certdog.cer");

    certificate.save_pem(&target).unwrap();

    let written = std::fs::read_to_string(&target).unwrap();
    assert!(written.starts_with("-----BEGIN CERTIFICATE-----"));
    assert_eq!(Certificate::from_pem(&written).unwrap(), certificate);
}
