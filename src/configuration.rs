use crate::business_rules::BusinessRules;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn port(&self) -> u16;
    fn database_url(&self) -> Option<String>;
    fn business_rules(&self) -> BusinessRules;
}
