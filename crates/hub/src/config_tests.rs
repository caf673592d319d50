use super::*;

#[test]
fn parses_a_minimal_config() {
    let cfg = HubConfig::from_toml(
        r#"
        [listen]
        address = "0.0.0.0:9100"
        "#,
    )
    .unwrap();
    assert_eq!(cfg.listen.address, "0.0.0.0:9100");
    assert!(cfg.blueprint_seeds.is_empty());
    assert!(cfg.peers.is_empty());
}

#[test]
fn parses_blueprint_seeds_and_peers() {
    let cfg = HubConfig::from_toml(
        r#"
        [listen]
        address = "127.0.0.1:9100"

        blueprint_seeds = ["blueprints/sensor.json", "blueprints/relay.json"]

        [[peers]]
        name = "site-b"
        driver_id = "tcp"
        address = "site-b.local:9100"
        "#,
    )
    .unwrap();
    assert_eq!(cfg.blueprint_seeds, vec!["blueprints/sensor.json", "blueprints/relay.json"]);
    assert_eq!(cfg.peers.len(), 1);
    assert_eq!(cfg.peers[0].name, "site-b");
    assert_eq!(cfg.peers[0].driver_id, "tcp");
}

#[test]
fn rejects_malformed_toml() {
    assert!(HubConfig::from_toml("not valid toml {{{").is_err());
}
