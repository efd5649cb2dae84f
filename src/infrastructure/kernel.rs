//! 内核
//!
//! 持有服务容器与根命令解析器：启动时定义并初始化全部服务，
//! 注册命令后解析参数并分发到对应命令。

use super::command::{CommandBase, CommandConstructor, CommandContext};
use super::container::{ContainerError, ServiceManager};
use super::service::ServiceDefinition;
use crate::constants::APP_NAME;
use crate::errors::{AppError, AppResult};
use crate::services;
use clap::error::ErrorKind;
use std::collections::HashMap;
use std::ffi::OsString;

/// 服务表构造函数
pub type DefinitionsBuilder = fn() -> Vec<ServiceDefinition>;

pub struct Kernel {
    services: ServiceManager,
    definitions: DefinitionsBuilder,
    root: clap::Command,
    commands: HashMap<String, Box<dyn CommandBase>>,
    booted: bool,
}

impl Kernel {
    pub fn new() -> Self {
        Self::with_definitions(services::service_definitions)
    }

    /// 使用自定义服务表创建内核
    pub fn with_definitions(definitions: DefinitionsBuilder) -> Self {
        Self {
            services: ServiceManager::new(),
            definitions,
            root: root_command(),
            commands: HashMap::new(),
            booted: false,
        }
    }

    pub fn services(&self) -> &ServiceManager {
        &self.services
    }

    pub fn is_booted(&self) -> bool {
        self.booted
    }

    /// 定义服务表并初始化全部服务
    pub async fn boot(&mut self) -> Result<(), ContainerError> {
        if self.booted {
            return Err(ContainerError::AlreadyBooted);
        }

        for definition in (self.definitions)() {
            self.services
                .define(definition.name, definition.constructor)
                .map_err(|e| ContainerError::BootFailed(Box::new(e)))?;
        }

        self.services
            .init_all()
            .await
            .map_err(|e| ContainerError::BootFailed(Box::new(e)))?;

        self.booted = true;
        log::debug!("内核已启动，服务: {:?}", self.services.get_names());
        Ok(())
    }

    /// 注册命令并挂载其子解析器
    pub fn register_command(
        &mut self,
        constructor: CommandConstructor,
    ) -> Result<(), ContainerError> {
        if !self.booted {
            return Err(ContainerError::NotBooted);
        }

        let command = constructor(CommandContext::new(self.services.clone()));
        let parser = command.on_enable();
        let name = parser.get_name().to_string();

        let root = std::mem::replace(&mut self.root, clap::Command::new(APP_NAME));
        self.root = root.subcommand(parser);

        if self.commands.insert(name.clone(), command).is_some() {
            log::debug!("命令 '{}' 已被重新注册", name);
        }
        Ok(())
    }

    pub fn register_commands(
        &mut self,
        constructors: impl IntoIterator<Item = CommandConstructor>,
    ) -> Result<(), ContainerError> {
        for constructor in constructors {
            self.register_command(constructor)?;
        }
        Ok(())
    }

    /// 解析参数并执行匹配的命令
    pub async fn run<I, T>(&mut self, args: I) -> AppResult<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = match self.root.try_get_matches_from_mut(args) {
            Ok(matches) => matches,
            Err(e) => match e.kind() {
                ErrorKind::DisplayHelp
                | ErrorKind::DisplayVersion
                | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                    e.print().map_err(|io| AppError::IO("printing help".to_string(), io))?;
                    return Ok(());
                }
                _ => return Err(AppError::cli(e.to_string())),
            },
        };

        let Some((name, sub_matches)) = matches.subcommand() else {
            self.root
                .print_help()
                .map_err(|io| AppError::IO("printing help".to_string(), io))?;
            return Ok(());
        };

        let command = self
            .commands
            .get(name)
            .ok_or_else(|| AppError::cli(format!("unknown command '{}'", name)))?;

        log::debug!("执行命令: {}", name);
        command.action(sub_matches).await
    }

    /// 销毁全部服务
    pub async fn shutdown(&mut self) {
        if !self.booted {
            return;
        }
        self.services.destroy_all().await;
        self.booted = false;
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

fn root_command() -> clap::Command {
    clap::Command::new(APP_NAME)
        .about("A high-performance CLI for fast development")
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
}
