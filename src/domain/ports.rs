use crate::domain::model::{Entity, ScanResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn headers(&self) -> &[String];
    fn include_paths(&self) -> &[String];
    fn defines(&self) -> &[String];
    fn output_path(&self) -> &str;
    fn manifest_name(&self) -> &str;
    fn pretty(&self) -> bool;
    fn platform_time_type(&self) -> &str;
    fn warnings_allowed(&self) -> bool;
    fn suppress_errors(&self) -> bool;
    fn init_exempt_fields(&self) -> &[String];
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Entity>>;
    async fn transform(&self, entities: Vec<Entity>) -> Result<ScanResult>;
    async fn load(&self, result: ScanResult) -> Result<String>;
}
