use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn bundle_path(&self) -> &str;
    fn data_set_path(&self) -> &str;
    fn report_path(&self) -> Option<&str>;
    fn error_threshold(&self) -> usize;
    fn show_data_preview(&self) -> bool;
    fn preview_rows(&self) -> usize;
    fn oca_version(&self) -> &str;
    fn default_encoding(&self) -> &str;
    fn enable_flagged_alarm(&self) -> bool;
    fn enable_version_alarm(&self) -> bool;
}
