//! 服务抽象
//!
//! 服务是内核管理的最小能力单元，每个名称在容器生命周期内只有一个实例。
//! 生命周期钩子全部可选：
//! - `on_register`：实例登记进容器后同步触发
//! - `on_init`：容器 `init_all` 时与其他服务并发执行
//! - `on_destroy`：实例从容器移除时执行

use super::container::ServiceContext;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 服务接口
#[async_trait]
pub trait Service: Any + Send + Sync {
    /// 实例登记后触发，可在此通过上下文查找其他服务
    fn on_register(&self, _ctx: &ServiceContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// 容器初始化时触发，不保证与其他服务的先后顺序
    async fn on_init(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// 销毁时触发
    async fn on_destroy(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// 容器持有的服务实例
///
/// 同一个 `Arc` 的两种视图：生命周期钩子使用 `dyn Service`，
/// 类型化访问通过 `dyn Any` 向下转型。
#[derive(Clone)]
pub struct ServiceHandle {
    service: Arc<dyn Service>,
    instance: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ServiceHandle {
    pub fn new<S: Service>(service: S) -> Self {
        Self::from_arc(Arc::new(service))
    }

    pub fn from_arc<S: Service>(service: Arc<S>) -> Self {
        Self {
            service: service.clone(),
            instance: service,
            type_name: std::any::type_name::<S>(),
        }
    }

    pub fn service(&self) -> &Arc<dyn Service> {
        &self.service
    }

    /// 实例的具体类型名称（用于错误信息）
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// 安全的类型转换
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.instance.clone().downcast::<T>().ok()
    }

    /// 两个句柄是否指向同一个实例
    pub fn ptr_eq(&self, other: &ServiceHandle) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance)
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// 服务构造函数
///
/// 构造期间可以通过上下文解析依赖，解析会递归进入容器。
pub type ServiceConstructor =
    Arc<dyn Fn(&ServiceContext) -> anyhow::Result<ServiceHandle> + Send + Sync>;

/// 将函数包装为服务构造函数
pub fn constructor<F>(factory: F) -> ServiceConstructor
where
    F: Fn(&ServiceContext) -> anyhow::Result<ServiceHandle> + Send + Sync + 'static,
{
    Arc::new(factory)
}

/// 服务定义表项：名称 → 构造函数
#[derive(Clone)]
pub struct ServiceDefinition {
    pub name: &'static str,
    pub constructor: ServiceConstructor,
}

impl ServiceDefinition {
    pub fn new(name: &'static str, constructor: ServiceConstructor) -> Self {
        Self { name, constructor }
    }
}

impl fmt::Debug for ServiceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDefinition")
            .field("name", &self.name)
            .finish()
    }
}
