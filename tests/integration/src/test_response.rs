//! Response decoding integration tests against canned documents.

#[cfg(test)]
mod tests {
    use xmlrpc_http::ErrorKind;
    use xmlrpc_model::Value;

    use crate::{FIXTURES, client_for, spawn_server};

    async fn call_fixture(name: &str) -> Result<Value, xmlrpc_http::ClientError> {
        let addr = spawn_server().await.unwrap();
        client_for(addr, &format!("/fixture/{name}"))
            .call("any", ())
            .await
    }

    #[tokio::test]
    async fn test_should_decode_canned_result() {
        assert_eq!(call_fixture("pow_result").await.unwrap(), Value::Int(512));
    }

    #[tokio::test]
    async fn test_should_decode_pretty_printed_result() {
        let value = call_fixture("pretty_struct").await.unwrap();
        assert_eq!(value.as_struct().unwrap()["ok"], Value::Boolean(true));
    }

    #[tokio::test]
    async fn test_should_translate_well_formed_fault() {
        let err = call_fixture("fault").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RemoteFault);
        assert_eq!(err.fault_code(), Some(-32601));
        assert!(err.to_string().contains("method \"pancake\" is not supported"));
    }

    #[tokio::test]
    async fn test_should_reject_every_malformed_fixture() {
        let malformed = FIXTURES
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| !matches!(*name, "pow_result" | "pretty_struct" | "fault"));

        for name in malformed {
            let err = call_fixture(name).await.unwrap_err();
            assert_eq!(
                err.kind(),
                ErrorKind::UnparsableResponse,
                "fixture {name}: {err}"
            );
            assert!(
                err.to_string().contains("cannot parse XML-RPC response"),
                "fixture {name}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_should_reject_fault_without_fault_code() {
        let err = call_fixture("parse_fault").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnparsableResponse);
    }

    #[tokio::test]
    async fn test_should_reject_fault_with_extra_members() {
        let err = call_fixture("parse_fault_members").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnparsableResponse);
    }

    #[tokio::test]
    async fn test_should_reject_value_with_two_typed_children() {
        let err = call_fixture("parse_error_onechildtag").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnparsableResponse);
    }

    #[tokio::test]
    async fn test_should_reject_wrong_root_element() {
        let err = call_fixture("wrong_xml_response").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnparsableResponse);
    }
}
