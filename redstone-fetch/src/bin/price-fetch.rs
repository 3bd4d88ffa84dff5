use std::process::ExitCode;

use redstone_fetch::{
    cli::{self, Tool},
    client::GatewayClient,
};

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> ExitCode {
    cli::init_tracing();
    let code = cli::run(
        Tool::Price,
        std::env::args_os(),
        |args| GatewayClient::new(args.gateway_config()),
        &mut std::io::stdout(),
    )
    .await;
    ExitCode::from(code)
}
