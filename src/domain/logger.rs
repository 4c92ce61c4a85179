/// Sink for doorbell events; the admin console shows whatever lands here.
pub trait EventLogger: Send + Sync {
    fn log(&self, ip: Option<&str>, action: &str, detail: &str);
}
