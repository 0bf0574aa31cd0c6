/*!
Utilitaires de test

- Init logging idempotent (env_logger)
- Endpoint local garanti fermé pour simuler un collector injoignable
*/

use anyhow::Result;
use std::net::TcpListener;

/// Init logging pour tests (sans effet si déjà initialisé)
pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// Réserve un port local puis le libère : toute connexion dessus est refusée
pub fn unused_local_endpoint() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}{}", addr, crate::mock_collector::STATUS_PATH))
}
