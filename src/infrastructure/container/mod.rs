//! 服务容器
//!
//! 按名称注册构造函数，首次查找时惰性实例化并缓存为单例。

pub mod manager;

pub use manager::{ServiceContext, ServiceManager};

use std::fmt;

/// 容器错误类型
#[derive(Debug)]
pub enum ContainerError {
    /// 服务未定义
    ServiceNotFound(String),
    /// 构造过程中再次请求自身
    CircularDependency(String),
    /// 容器初始化完成后仍尝试定义服务
    DefineAfterInit(String),
    /// 重复初始化
    AlreadyInitialized,
    /// 类型转换失败
    TypeCastFailed {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
    /// 构造函数或 on_register 失败
    CreationFailed {
        name: String,
        source: anyhow::Error,
    },
    /// on_init 失败
    InitFailed {
        name: String,
        source: anyhow::Error,
    },
    /// on_destroy 失败
    DestroyFailed {
        name: String,
        source: anyhow::Error,
    },
    /// 上下文所属的容器已被释放
    ContainerDropped(String),
    /// 内核重复启动
    AlreadyBooted,
    /// 内核尚未启动
    NotBooted,
    /// 内核启动失败
    BootFailed(Box<ContainerError>),
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::ServiceNotFound(name) => {
                write!(f, "Service not found: {}", name)
            }
            ContainerError::CircularDependency(name) => {
                write!(f, "Circular dependency detected: {}", name)
            }
            ContainerError::DefineAfterInit(name) => {
                write!(
                    f,
                    "Cannot define service '{}' after the container has been initialized",
                    name
                )
            }
            ContainerError::AlreadyInitialized => {
                write!(f, "Service container is already initialized")
            }
            ContainerError::TypeCastFailed {
                name,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Type cast failed for service '{}': expected {}, got {}",
                    name, expected, actual
                )
            }
            ContainerError::CreationFailed { name, source } => {
                write!(f, "Failed to create service '{}': {:#}", name, source)
            }
            ContainerError::InitFailed { name, source } => {
                write!(f, "Failed to initialize service '{}': {:#}", name, source)
            }
            ContainerError::DestroyFailed { name, source } => {
                write!(f, "Failed to destroy service '{}': {:#}", name, source)
            }
            ContainerError::ContainerDropped(name) => {
                write!(
                    f,
                    "Service container was dropped while looking up '{}'",
                    name
                )
            }
            ContainerError::AlreadyBooted => write!(f, "Kernel is already booted"),
            ContainerError::NotBooted => write!(f, "Kernel is not booted"),
            ContainerError::BootFailed(err) => write!(f, "Kernel boot failed: {}", err),
        }
    }
}

impl std::error::Error for ContainerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContainerError::CreationFailed { source, .. }
            | ContainerError::InitFailed { source, .. }
            | ContainerError::DestroyFailed { source, .. } => {
                let source: &(dyn std::error::Error + 'static) = source.as_ref();
                Some(source)
            }
            ContainerError::BootFailed(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl ContainerError {
    /// 是否为（可能被包装的）循环依赖错误
    pub fn is_circular(&self) -> bool {
        match self {
            ContainerError::CircularDependency(_) => true,
            ContainerError::CreationFailed { source, .. } => source
                .downcast_ref::<ContainerError>()
                .map_or(false, ContainerError::is_circular),
            ContainerError::BootFailed(err) => err.is_circular(),
            _ => false,
        }
    }
}
