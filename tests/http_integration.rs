//! HTTP integration tests using wiremock
//!
//! These tests run the ARM client and the deployment engine against a mock
//! server to verify request paths, status mapping and long-running
//! operation handling without touching Azure.

use azdeploy::azure::auth::AzureCredentials;
use azdeploy::azure::{AzureClient, AzureError, ResourceOperations};
use azdeploy::compute::{Image, VirtualMachine};
use azdeploy::resources::create_resource_group_config;
use azdeploy::strategy::{deploy, EntityConfig, GetParams, SubscriptionContext};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUB: &str = "00000000-0000-0000-0000-000000000000";
const VM_PATH: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/rg1/providers/Microsoft.Compute/virtualMachines/vm1";

fn client(server: &MockServer) -> AzureClient {
    AzureClient::new(SUB, &server.uri(), AzureCredentials::from_token("test-token"))
        .expect("client should build")
        .with_poll_interval(Duration::from_millis(10))
}

#[tokio::test]
async fn test_get_sends_bearer_token_and_api_version() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(VM_PATH))
        .and(query_param("api-version", "2017-12-01"))
        .and(header("authorization", "Bearer test-token"))
        .and(header_exists("x-ms-client-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": VM_PATH,
            "name": "vm1",
            "location": "eastus",
            "properties": {
                "hardwareProfile": {"vmSize": "Standard_A1"},
                "provisioningState": "Succeeded"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let vm: VirtualMachine = azdeploy::compute::virtual_machine::strategy()
        .get(
            &client,
            GetParams {
                resource_group_name: "rg1",
                name: "vm1",
                cancellation_token: &CancellationToken::new(),
            },
        )
        .await
        .expect("get should succeed");

    assert_eq!(vm.name.as_deref(), Some("vm1"));
    assert_eq!(vm.properties.hardware_profile.unwrap().vm_size, "Standard_A1");
    assert_eq!(vm.properties.provisioning_state.as_deref(), Some("Succeeded"));
}

#[tokio::test]
async fn test_get_404_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(VM_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "ResourceNotFound", "message": "not found"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .get(VM_PATH, "2017-12-01", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_error_body_is_parsed() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(VM_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": "OperationNotAllowed", "message": "quota exceeded"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_or_update(VM_PATH, "2017-12-01", &json!({}), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        AzureError::Api { status, code, message } => {
            assert_eq!(status.as_u16(), 409);
            assert_eq!(code, "OperationNotAllowed");
            assert_eq!(message, "quota exceeded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_put_without_async_header_returns_body() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(VM_PATH))
        .and(body_partial_json(json!({"location": "eastus"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": VM_PATH,
            "location": "eastus"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let value = client(&server)
        .create_or_update(
            VM_PATH,
            "2017-12-01",
            &json!({"location": "eastus"}),
            &CancellationToken::new(),
        )
        .await
        .expect("put should succeed");

    assert_eq!(value["id"], VM_PATH);
}

#[tokio::test]
async fn test_put_polls_async_operation_then_gets_resource() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/op1", server.uri());

    Mock::given(method("PUT"))
        .and(path(VM_PATH))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Azure-AsyncOperation", operation_url.as_str())
                .insert_header("Retry-After", "0")
                .set_body_json(json!({"properties": {"provisioningState": "Creating"}})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/op1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(VM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": VM_PATH,
            "properties": {"provisioningState": "Succeeded"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let value = client(&server)
        .create_or_update(VM_PATH, "2017-12-01", &json!({}), &CancellationToken::new())
        .await
        .expect("put should succeed");

    assert_eq!(value["properties"]["provisioningState"], "Succeeded");
}

#[tokio::test]
async fn test_failed_async_operation_is_an_error() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/op2", server.uri());

    Mock::given(method("PUT"))
        .and(path(VM_PATH))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Azure-AsyncOperation", operation_url.as_str())
                .insert_header("Retry-After", "0"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/op2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Failed",
            "error": {"code": "OSProvisioningTimedOut", "message": "timed out"}
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_or_update(VM_PATH, "2017-12-01", &json!({}), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AzureError::OperationFailed { ref status, ref message } if status == "Failed" && message == "timed out"
    ));
}

#[tokio::test]
async fn test_cancelled_token_aborts_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(VM_PATH))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client(&server)
        .get(VM_PATH, "2017-12-01", &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, AzureError::Cancelled));
}

#[tokio::test]
async fn test_get_retries_once_after_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(VM_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": "ExpiredAuthenticationToken", "message": "expired"}
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(VM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": VM_PATH})))
        .expect(1)
        .mount(&server)
        .await;

    let value = client(&server)
        .get(VM_PATH, "2017-12-01", &CancellationToken::new())
        .await
        .expect("retry should succeed");

    assert_eq!(value["id"], VM_PATH);
}

#[tokio::test]
async fn test_put_follows_location_header_until_done() {
    let server = MockServer::start().await;
    let location_url = format!("{}/operations/loc1", server.uri());

    Mock::given(method("PUT"))
        .and(path(VM_PATH))
        .respond_with(
            ResponseTemplate::new(202)
                .insert_header("Location", location_url.as_str())
                .insert_header("Retry-After", "0"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/loc1"))
        .respond_with(ResponseTemplate::new(202).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/loc1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(VM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": VM_PATH,
            "properties": {"provisioningState": "Succeeded"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let value = client(&server)
        .create_or_update(VM_PATH, "2017-12-01", &json!({}), &CancellationToken::new())
        .await
        .expect("put should succeed");

    assert_eq!(value["properties"]["provisioningState"], "Succeeded");
}

#[tokio::test]
async fn test_cancel_during_poll_wait() {
    let server = MockServer::start().await;
    let operation_url = format!("{}/operations/op3", server.uri());

    Mock::given(method("PUT"))
        .and(path(VM_PATH))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Azure-AsyncOperation", operation_url.as_str())
                .insert_header("Retry-After", "30"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/operations/op3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        client(&server).create_or_update(VM_PATH, "2017-12-01", &json!({}), &cancel),
    )
    .await
    .expect("cancellation should end the wait")
    .unwrap_err();

    assert!(matches!(err, AzureError::Cancelled));
}

#[tokio::test]
async fn test_deploy_new_vm_graph() {
    let server = MockServer::start().await;

    // Nothing exists yet
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    // Every PUT echoes a provisioned resource
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "location": "eastus",
            "properties": {"provisioningState": "Succeeded"}
        })))
        .expect(5)
        .mount(&server)
        .await;

    let rg = create_resource_group_config("rg1");
    let vnet = rg.create_virtual_network_config("vm1", "192.168.0.0/16", "vm1", "192.168.1.0/24");
    let pip = rg.create_public_ip_address_config("vm1", None);
    let nic = rg.create_network_interface_config("vm1", &vnet, "vm1", &pip);
    let image = Image::new("Canonical", "UbuntuServer", "18.04-LTS", "latest");
    let vm = rg.create_virtual_machine_config("vm1", &nic, false, "azureuser", "P@ss1234", &image, "Standard_DS1_v2");
    let root: Arc<dyn EntityConfig> = vm;

    let ctx = SubscriptionContext::new(SUB, "eastus");
    let report = deploy::apply(&client(&server), &ctx, &root, &CancellationToken::new(), &|_| {})
        .await
        .expect("deployment should succeed");

    assert_eq!(report.created.len(), 5);
    assert_eq!(report.estimated_seconds, 140);
    assert_eq!(report.created.last().unwrap().id_to_string(), VM_PATH);

    let requests = server.received_requests().await.unwrap();
    let vm_put = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT" && r.url.path() == VM_PATH)
        .expect("vm PUT should be sent");
    let body: serde_json::Value = serde_json::from_slice(&vm_put.body).unwrap();
    assert_eq!(
        body["properties"]["networkProfile"]["networkInterfaces"][0]["id"],
        format!("/subscriptions/{SUB}/resourceGroups/rg1/providers/Microsoft.Network/networkInterfaces/vm1")
    );
    assert_eq!(body["properties"]["osProfile"]["adminPassword"], "P@ss1234");
}
