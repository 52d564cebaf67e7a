use std::sync::Arc;

use crate::config::AuthConfig;
use crate::email::Mailer;
use crate::storage::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub mailer: Arc<dyn Mailer>,
    pub auth: Arc<AuthConfig>,
}
