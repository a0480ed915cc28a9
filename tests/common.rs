use httptest::{matchers::request, responders::json_encoded, Expectation, Server};
use serde_json::Value;

use blacktri::{models::BlackTriOptions, Client};

pub const CLIENT_ID: u64 = 12;

pub fn expect_request(server: &Server, method: &'static str, path: &'static str, response: Value) {
    server.expect(
        Expectation::matching(request::method_path(method, path))
            .respond_with(json_encoded(response)),
    );
}

pub fn create_client(server: &Server) -> Client {
    Client::new(
        "api_key".to_string(),
        "api_secret".to_string(),
        BlackTriOptions {
            api_url: Some(format!("http://{}/api/v1/", server.addr())),
            ..BlackTriOptions::new(CLIENT_ID)
        },
    )
    .expect("should be able to create blacktri client")
}
