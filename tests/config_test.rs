use arb_liquidity_bridge::config::{BridgeConfig, BridgeDirection, ARB_SYS_ADDRESS, NODE_INTERFACE_ADDRESS};
use serial_test::serial;
use std::io::Write;
use std::time::Duration;

const VARS: &[&str] = &[
    "ETHEREUM_RPC_URL",
    "MAINNET_RPC_URL",
    "ARBITRUM_RPC_URL",
    "BRIDGE_DIRECTION",
    "L1_CHAIN_SELECTOR",
    "L2_CHAIN_SELECTOR",
    "L1_LIQUIDITY_MANAGER",
    "L2_LIQUIDITY_MANAGER",
    "L1_BRIDGE_ADAPTER",
    "L1_GATEWAY_ROUTER",
    "L2_GATEWAY",
    "ARBITRUM_INBOX",
    "ARBITRUM_ROLLUP",
    "LOCAL_TOKEN",
    "REMOTE_TOKEN",
    "LOG_LOOKBACK_SECS",
    "L1_LOG_LOOKBACK_BLOCKS",
    "L2_LOG_LOOKBACK_BLOCKS",
    "L1_LOG_CHUNK_BLOCKS",
    "L2_LOG_CHUNK_BLOCKS",
    "REQUEST_TIMEOUT_SECS",
    "MAX_FEE_PER_GAS_MULTIPLIER",
    "SUBMISSION_FEE_MULTIPLIER",
];

const ENV_FILE: &str = "\
MAINNET_RPC_URL=http://localhost:8545
ARBITRUM_RPC_URL=http://localhost:8547
BRIDGE_DIRECTION=l2-to-l1
L1_CHAIN_SELECTOR=5009297550715157269
L2_CHAIN_SELECTOR=4949039107694359620
L1_LIQUIDITY_MANAGER=0x1000000000000000000000000000000000000001
L2_LIQUIDITY_MANAGER=0x2000000000000000000000000000000000000002
L1_BRIDGE_ADAPTER=0x1000000000000000000000000000000000000003
L1_GATEWAY_ROUTER=0x72Ce9c846789fdB6fC1f34aC4AD25Dd9ef7031ef
L2_GATEWAY=0x09e9222E96E7B4AE2a407B98d48e330053351EEe
ARBITRUM_INBOX=0x4Dbd4fc535Ac27206064B68FfCf827b0A60BAB3f
ARBITRUM_ROLLUP=0x5eF0D09d1E6204141B4d37530808eD19f60FBa35
LOCAL_TOKEN=0x2000000000000000000000000000000000000009
REMOTE_TOKEN=0x1000000000000000000000000000000000000009
";

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

fn write_env(extra: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{ENV_FILE}{extra}").unwrap();
    file
}

#[test]
#[serial]
fn test_loads_config_from_env_file() {
    clear_env();
    let file = write_env("");

    let config = BridgeConfig::from_env_file(file.path()).unwrap();
    assert_eq!(config.ethereum_rpc, "http://localhost:8545");
    assert_eq!(config.arbitrum_rpc, "http://localhost:8547");
    assert_eq!(config.direction, BridgeDirection::L2ToL1);
    assert_eq!(config.l1_selector.0, 5009297550715157269);
    assert_eq!(config.l2_selector.0, 4949039107694359620);
    assert_eq!(config.log_lookback_secs, 14 * 24 * 3600);
    assert_eq!(config.l1_log_lookback_blocks, 100_800);
    assert_eq!(config.l2_log_lookback_blocks, 4_838_400);
    assert_eq!(config.l1_log_chunk_blocks, 500);
    assert_eq!(config.l2_log_chunk_blocks, 10_000);
    assert_eq!(config.request_timeout, Duration::from_secs(120));
    assert_eq!(config.fees.max_fee_per_gas_multiplier, 3);
    assert_eq!(config.fees.submission_fee_multiplier, 4);
    assert_eq!(config.fees.node_interface, NODE_INTERFACE_ADDRESS);
    assert_eq!(config.fees.arb_sys, ARB_SYS_ADDRESS);
    clear_env();
}

#[test]
#[serial]
fn test_overrides_and_preferred_rpc_var() {
    clear_env();
    let file = write_env(
        "ETHEREUM_RPC_URL=http://eth:8545\nLOG_LOOKBACK_SECS=60\nREQUEST_TIMEOUT_SECS=5\nSUBMISSION_FEE_MULTIPLIER=6\nL1_LOG_LOOKBACK_BLOCKS=42\n",
    );

    let config = BridgeConfig::from_env_file(file.path()).unwrap();
    assert_eq!(config.ethereum_rpc, "http://eth:8545");
    assert_eq!(config.log_lookback_secs, 60);
    assert_eq!(config.l1_log_lookback_blocks, 42);
    assert_eq!(config.l2_log_lookback_blocks, 240);
    assert_eq!(config.request_timeout, Duration::from_secs(5));
    assert_eq!(config.fees.submission_fee_multiplier, 6);
    assert_eq!(config.fees.max_fee_per_gas_multiplier, 3);
    clear_env();
}

#[test]
#[serial]
fn test_missing_and_malformed_vars() {
    clear_env();
    let file = write_env("");
    BridgeConfig::from_env_file(file.path()).unwrap();

    std::env::remove_var("ARBITRUM_ROLLUP");
    let err = BridgeConfig::from_env_file("/nonexistent/.env").unwrap_err();
    assert!(err.to_string().contains("failed to load"));

    // dotenv does not override variables that are already set.
    std::env::set_var("L2_GATEWAY", "not-an-address");
    let err = BridgeConfig::from_env_file(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("L2_GATEWAY"));

    clear_env();
    std::env::set_var("BRIDGE_DIRECTION", "sideways");
    let err = BridgeConfig::from_env_file(write_env("").path()).unwrap_err();
    assert!(err.to_string().contains("sideways"));
    clear_env();
}

#[test]
fn test_direction_parsing() {
    assert_eq!("l1-to-l2".parse::<BridgeDirection>().unwrap(), BridgeDirection::L1ToL2);
    assert_eq!("L1_TO_L2".parse::<BridgeDirection>().unwrap(), BridgeDirection::L1ToL2);
    assert_eq!(" l2-to-l1 ".parse::<BridgeDirection>().unwrap(), BridgeDirection::L2ToL1);
    assert!("l3-to-l1".parse::<BridgeDirection>().is_err());
}
