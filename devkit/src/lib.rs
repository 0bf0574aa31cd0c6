/*!
# Vigil DevKit - Mocks et utilitaires pour tests

Bibliothèque facilitant les tests du reporter avec:
- Mock collector HTTP à comportement scripté (200, 500, réponse bloquée)
- Endpoint local fermé pour simuler une connexion refusée
*/

pub mod mock_collector;
pub mod test_utils;

pub use mock_collector::{Behavior, MockCollector, ReceivedReport, STATUS_PATH};
pub use test_utils::{init_logging, unused_local_endpoint};
