//! fast CLI Entry Point

use fast::commands::command_definitions;
use fast::logging::init_logger;
use fast::{AppResult, Kernel};

async fn run(kernel: &mut Kernel) -> AppResult<()> {
    kernel.boot().await?;
    kernel.register_commands(command_definitions())?;
    kernel.run(std::env::args_os()).await
}

#[tokio::main]
async fn main() {
    init_logger();

    let mut kernel = Kernel::new();
    let result = run(&mut kernel).await;
    // 无论成功与否都要关闭服务，确保配置写盘
    kernel.shutdown().await;

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(e.exit_code());
    }
}
