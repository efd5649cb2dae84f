//! 基础设施层
//!
//! 提供命令行工具的服务内核，包括：
//! - 服务抽象与生命周期钩子
//! - 按名称注册、惰性实例化的服务容器
//! - 内核（服务启动/关闭、命令注册与分发）
//! - 命令抽象

pub mod command;
pub mod container;
pub mod kernel;
pub mod service;

// 重新导出API
pub use command::{CommandBase, CommandConstructor, CommandContext};
pub use container::{ContainerError, ServiceContext, ServiceManager};
pub use kernel::Kernel;
pub use service::{constructor, Service, ServiceConstructor, ServiceDefinition, ServiceHandle};
