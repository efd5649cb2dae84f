//! 服务管理器
//!
//! 名称到构造函数的注册表。实例在首次查找时创建并缓存，
//! 构造期间通过 [`ServiceContext`] 递归解析依赖，因此定义顺序无关紧要，
//! 只要依赖关系中没有环。

use super::ContainerError;
use crate::infrastructure::service::{ServiceConstructor, ServiceHandle};
use futures_util::future::try_join_all;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

#[derive(Default)]
struct ManagerState {
    /// 服务定义，按名称索引
    definitions: HashMap<String, ServiceConstructor>,
    /// 定义顺序
    order: Vec<String>,
    /// 已创建的实例
    instances: HashMap<String, ServiceHandle>,
    /// 正在构造中的服务名称（用于检测循环依赖）
    instantiating: HashSet<String>,
    initialized: bool,
}

impl ManagerState {
    fn ordered_instances(&self) -> Vec<(String, ServiceHandle)> {
        self.order
            .iter()
            .filter_map(|name| {
                self.instances
                    .get(name)
                    .map(|handle| (name.clone(), handle.clone()))
            })
            .collect()
    }
}

/// 服务管理器
///
/// 克隆开销很低，所有克隆共享同一份注册表。
#[derive(Clone, Default)]
pub struct ServiceManager {
    state: Arc<Mutex<ManagerState>>,
}

impl ServiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册服务构造函数
    ///
    /// 容器完成 `init_all` 之后不再接受新的定义。
    pub fn define(
        &self,
        name: impl Into<String>,
        constructor: ServiceConstructor,
    ) -> Result<(), ContainerError> {
        let name = name.into();
        let mut state = self.state.lock();
        if state.initialized {
            return Err(ContainerError::DefineAfterInit(name));
        }

        if state
            .definitions
            .insert(name.clone(), constructor)
            .is_some()
        {
            log::debug!("服务 '{}' 的定义已被替换", name);
        } else {
            state.order.push(name);
        }
        Ok(())
    }

    /// 获取服务实例，必要时按定义创建；未定义时返回 `None`
    pub fn get(&self, name: &str) -> Result<Option<ServiceHandle>, ContainerError> {
        let constructor = {
            let state = self.state.lock();
            if let Some(handle) = state.instances.get(name) {
                return Ok(Some(handle.clone()));
            }
            match state.definitions.get(name) {
                Some(constructor) => constructor.clone(),
                None => return Ok(None),
            }
        };

        self.instantiate(name, constructor).map(Some)
    }

    /// 获取服务实例，未定义时返回错误
    pub fn require(&self, name: &str) -> Result<ServiceHandle, ContainerError> {
        self.get(name)?
            .ok_or_else(|| ContainerError::ServiceNotFound(name.to_string()))
    }

    /// 类型化的 [`get`](Self::get)
    pub fn get_service<T: Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Option<Arc<T>>, ContainerError> {
        match self.get(name)? {
            Some(handle) => downcast_handle(name, &handle).map(Some),
            None => Ok(None),
        }
    }

    /// 类型化的 [`require`](Self::require)
    pub fn require_service<T: Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Arc<T>, ContainerError> {
        let handle = self.require(name)?;
        downcast_handle(name, &handle)
    }

    /// 创建服务实例
    ///
    /// 已存在时直接返回；构造期间再次请求同名服务视为循环依赖。
    /// 构造函数与 `on_register` 运行时不持有锁。
    pub fn instantiate(
        &self,
        name: &str,
        constructor: ServiceConstructor,
    ) -> Result<ServiceHandle, ContainerError> {
        {
            let mut state = self.state.lock();
            if let Some(handle) = state.instances.get(name) {
                return Ok(handle.clone());
            }
            if !state.instantiating.insert(name.to_string()) {
                return Err(ContainerError::CircularDependency(name.to_string()));
            }
        }

        let ctx = self.context();
        let handle = match constructor(&ctx) {
            Ok(handle) => handle,
            Err(source) => {
                self.state.lock().instantiating.remove(name);
                return Err(ContainerError::CreationFailed {
                    name: name.to_string(),
                    source,
                });
            }
        };

        {
            let mut state = self.state.lock();
            state.instantiating.remove(name);
            state.instances.insert(name.to_string(), handle.clone());
        }

        if let Err(source) = handle.service().on_register(&ctx) {
            self.state.lock().instances.remove(name);
            return Err(ContainerError::CreationFailed {
                name: name.to_string(),
                source,
            });
        }

        log::debug!("服务 '{}' 已注册 ({})", name, handle.type_name());
        Ok(handle)
    }

    /// 实例化所有服务并并发执行 `on_init`
    pub async fn init_all(&self) -> Result<(), ContainerError> {
        let pending: Vec<(String, ServiceConstructor)> = {
            let state = self.state.lock();
            if state.initialized {
                return Err(ContainerError::AlreadyInitialized);
            }
            state
                .order
                .iter()
                .filter(|name| !state.instances.contains_key(*name))
                .filter_map(|name| {
                    state
                        .definitions
                        .get(name)
                        .map(|constructor| (name.clone(), constructor.clone()))
                })
                .collect()
        };

        // 先完成所有静态依赖装配，未被显式请求的服务也会被创建
        for (name, constructor) in pending {
            self.instantiate(&name, constructor)?;
        }

        let instances = self.state.lock().ordered_instances();
        log::debug!("初始化 {} 个服务", instances.len());

        try_join_all(instances.into_iter().map(|(name, handle)| async move {
            handle
                .service()
                .on_init()
                .await
                .map_err(|source| ContainerError::InitFailed { name, source })
        }))
        .await?;

        self.state.lock().initialized = true;
        Ok(())
    }

    /// 销毁单个服务实例
    pub async fn destroy(&self, name: &str) -> Result<(), ContainerError> {
        let handle = self.state.lock().instances.remove(name);
        if let Some(handle) = handle {
            handle
                .service()
                .on_destroy()
                .await
                .map_err(|source| ContainerError::DestroyFailed {
                    name: name.to_string(),
                    source,
                })?;
            log::debug!("服务 '{}' 已销毁", name);
        }
        Ok(())
    }

    /// 按定义的逆序销毁全部实例
    ///
    /// 单个服务销毁失败只记录日志，不中断其余服务的清理。
    pub async fn destroy_all(&self) {
        let names: Vec<String> = {
            let state = self.state.lock();
            state
                .order
                .iter()
                .rev()
                .filter(|name| state.instances.contains_key(*name))
                .cloned()
                .collect()
        };

        for name in names {
            if let Err(e) = self.destroy(&name).await {
                log::warn!("{}", e);
            }
        }

        self.state.lock().initialized = false;
    }

    /// 名称是否已定义或已实例化
    pub fn has(&self, name: &str) -> bool {
        let state = self.state.lock();
        state.definitions.contains_key(name) || state.instances.contains_key(name)
    }

    /// 所有已定义或已实例化的服务名称，按定义顺序
    pub fn get_names(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut names = state.order.clone();
        let mut extra: Vec<String> = state
            .instances
            .keys()
            .filter(|name| !state.definitions.contains_key(*name))
            .cloned()
            .collect();
        extra.sort();
        names.extend(extra);
        names
    }

    pub fn is_instantiated(&self, name: &str) -> bool {
        self.state.lock().instances.contains_key(name)
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    /// 创建指向本容器的服务上下文
    pub fn context(&self) -> ServiceContext {
        ServiceContext {
            state: Arc::downgrade(&self.state),
        }
    }
}

fn downcast_handle<T: Send + Sync + 'static>(
    name: &str,
    handle: &ServiceHandle,
) -> Result<Arc<T>, ContainerError> {
    handle
        .downcast::<T>()
        .ok_or_else(|| ContainerError::TypeCastFailed {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
            actual: handle.type_name(),
        })
}

/// 服务上下文
///
/// 服务构造时拿到的受限视图，只能按名称查找其他服务，不持有容器。
#[derive(Clone)]
pub struct ServiceContext {
    state: Weak<Mutex<ManagerState>>,
}

impl ServiceContext {
    fn manager(&self, name: &str) -> Result<ServiceManager, ContainerError> {
        self.state
            .upgrade()
            .map(|state| ServiceManager { state })
            .ok_or_else(|| ContainerError::ContainerDropped(name.to_string()))
    }

    pub fn require(&self, name: &str) -> Result<ServiceHandle, ContainerError> {
        self.manager(name)?.require(name)
    }

    pub fn get_service<T: Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Option<Arc<T>>, ContainerError> {
        self.manager(name)?.get_service(name)
    }

    pub fn require_service<T: Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Arc<T>, ContainerError> {
        self.manager(name)?.require_service(name)
    }
}
