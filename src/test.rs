use crate::server::ServerConfig;

#[tokio::test]
async fn example_config_is_valid() {
    ServerConfig::from_config_file("config.example.yaml")
        .await
        .expect("Example config is not parsable");
}

#[tokio::test]
async fn missing_config_file_is_a_read_error() {
    let err = ServerConfig::from_config_file("does-not-exist.yaml")
        .await
        .expect_err("File does not exist");

    assert!(err.to_string().contains("does-not-exist.yaml"));
}
