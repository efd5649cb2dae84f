//! 内核测试
//!
//! 验证服务启动、命令注册与分发以及关闭流程

use async_trait::async_trait;
use clap::{Arg, ArgMatches};
use fast::infrastructure::{
    constructor, CommandBase, CommandContext, ContainerError, Service, ServiceDefinition,
    ServiceHandle,
};
use fast::{AppError, AppResult, Kernel};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 测试用的问候服务
struct Greeter {
    greeting: String,
}

impl Service for Greeter {}

/// 依赖问候服务的格式化服务
struct Formatter {
    greeter: std::sync::Arc<Greeter>,
}

impl Service for Formatter {}

impl Formatter {
    fn format(&self, name: &str) -> String {
        format!("{} {}", self.greeter.greeting, name)
    }
}

static OUTPUT: Mutex<Vec<String>> = parking_lot::const_mutex(Vec::new());
static DESTROYED: AtomicUsize = AtomicUsize::new(0);

fn test_definitions() -> Vec<ServiceDefinition> {
    vec![
        // 依赖先于被依赖者定义
        ServiceDefinition::new(
            "formatter",
            constructor(|ctx| {
                let greeter = ctx.require_service::<Greeter>("greeter")?;
                Ok(ServiceHandle::new(Formatter { greeter }))
            }),
        ),
        ServiceDefinition::new(
            "greeter",
            constructor(|_| {
                Ok(ServiceHandle::new(Greeter {
                    greeting: "hello".to_string(),
                }))
            }),
        ),
    ]
}

/// 销毁时计数的服务
struct Tracked;

#[async_trait]
impl Service for Tracked {
    async fn on_destroy(&self) -> anyhow::Result<()> {
        DESTROYED.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn tracked_definitions() -> Vec<ServiceDefinition> {
    vec![ServiceDefinition::new(
        "tracked",
        constructor(|_| Ok(ServiceHandle::new(Tracked))),
    )]
}

fn failing_definitions() -> Vec<ServiceDefinition> {
    vec![ServiceDefinition::new(
        "broken",
        constructor(|_| anyhow::bail!("missing credentials")),
    )]
}

struct GreetCommand {
    ctx: CommandContext,
}

impl GreetCommand {
    fn create(ctx: CommandContext) -> Box<dyn CommandBase> {
        Box::new(Self { ctx })
    }
}

#[async_trait]
impl CommandBase for GreetCommand {
    fn on_enable(&self) -> clap::Command {
        clap::Command::new("greet")
            .about("打招呼")
            .arg(Arg::new("name").required(true))
    }

    async fn action(&self, matches: &ArgMatches) -> AppResult<()> {
        let formatter = self.ctx.require_service::<Formatter>("formatter")?;
        let name = matches
            .get_one::<String>("name")
            .ok_or_else(|| AppError::cli("name is required"))?;
        OUTPUT.lock().push(formatter.format(name));
        Ok(())
    }
}

async fn booted_kernel() -> Kernel {
    let mut kernel = Kernel::with_definitions(test_definitions);
    kernel.boot().await.unwrap();
    kernel.register_command(GreetCommand::create).unwrap();
    kernel
}

#[tokio::test]
async fn test_boot_realizes_services() {
    let kernel = booted_kernel().await;

    assert!(kernel.is_booted());
    assert!(kernel.services().is_initialized());
    assert!(kernel.services().is_instantiated("greeter"));
    assert!(kernel.services().is_instantiated("formatter"));
    assert_eq!(kernel.services().get_names(), vec!["formatter", "greeter"]);
}

#[tokio::test]
async fn test_services_are_singletons() {
    let kernel = booted_kernel().await;

    let first = kernel.services().require_service::<Greeter>("greeter").unwrap();
    let second = kernel.services().require_service::<Greeter>("greeter").unwrap();
    let formatter = kernel.services().require_service::<Formatter>("formatter").unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert!(std::sync::Arc::ptr_eq(&first, &formatter.greeter));
}

#[tokio::test]
async fn test_boot_twice_fails() {
    let mut kernel = booted_kernel().await;
    let before = kernel.services().require("greeter").unwrap();

    let err = kernel.boot().await.unwrap_err();
    assert!(matches!(err, ContainerError::AlreadyBooted));

    // 第一次启动的服务不受影响
    let after = kernel.services().require("greeter").unwrap();
    assert!(before.ptr_eq(&after));
}

#[tokio::test]
async fn test_boot_failure_is_wrapped() {
    let mut kernel = Kernel::with_definitions(failing_definitions);

    let err = kernel.boot().await.unwrap_err();
    assert!(matches!(err, ContainerError::BootFailed(_)));
    assert!(err.to_string().contains("missing credentials"));
    assert!(!kernel.is_booted());
}

#[tokio::test]
async fn test_register_before_boot_fails() {
    let mut kernel = Kernel::with_definitions(test_definitions);

    let err = kernel.register_command(GreetCommand::create).unwrap_err();
    assert!(matches!(err, ContainerError::NotBooted));
}

#[tokio::test]
async fn test_run_dispatches_to_command() {
    let mut kernel = booted_kernel().await;

    kernel.run(["fast", "greet", "kernel"]).await.unwrap();

    assert!(OUTPUT.lock().contains(&"hello kernel".to_string()));
}

#[tokio::test]
async fn test_run_reports_parse_errors() {
    let mut kernel = booted_kernel().await;

    let unknown = kernel.run(["fast", "unknown"]).await.unwrap_err();
    assert!(matches!(unknown, AppError::Cli(_)));
    assert_eq!(unknown.exit_code(), 1);

    let missing_arg = kernel.run(["fast", "greet"]).await.unwrap_err();
    assert!(matches!(missing_arg, AppError::Cli(_)));
}

#[tokio::test]
async fn test_help_and_version_succeed() {
    let mut kernel = booted_kernel().await;

    kernel.run(["fast", "--help"]).await.unwrap();
    kernel.run(["fast", "--version"]).await.unwrap();
    // 没有子命令时输出帮助
    kernel.run(["fast"]).await.unwrap();
}

#[tokio::test]
async fn test_shutdown_destroys_services() {
    let mut kernel = Kernel::with_definitions(tracked_definitions);
    kernel.boot().await.unwrap();

    kernel.shutdown().await;
    assert_eq!(DESTROYED.load(Ordering::SeqCst), 1);
    assert!(!kernel.is_booted());
    assert!(!kernel.services().is_instantiated("tracked"));

    // 未启动时关闭是空操作
    kernel.shutdown().await;
    assert_eq!(DESTROYED.load(Ordering::SeqCst), 1);
}
