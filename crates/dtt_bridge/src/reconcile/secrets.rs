//! Secrets domain binding and the identicon seam.

use crate::model::command::Domain;
use crate::model::snapshot::{Secret, Snapshot};
use crate::reconcile::DomainSlot;

/// Edge length, in pixels, the secrets view requests identicons at.
pub const IDENTICON_SIZE: u32 = 200;

/// Secrets as last reported by the core, in arrival order.
pub struct SecretsDomain;

impl DomainSlot for SecretsDomain {
    type State = Vec<Secret>;

    const DOMAIN: Domain = Domain::Secrets;

    fn extract(snapshot: &Snapshot) -> Option<&Self::State> {
        snapshot.secrets.as_ref()
    }
}

/// Renders a visual fingerprint (for example an SVG) from a secret hash.
///
/// Implemented by the rendering layer; the bridge only supplies the key.
pub trait IdenticonRenderer {
    fn render(&self, key: &str, size: u32) -> String;
}

/// Renders one identicon per secret, keyed by hash, in input order.
pub fn render_identicons(
    secrets: &[Secret],
    renderer: &dyn IdenticonRenderer,
) -> Vec<(String, String)> {
    secrets
        .iter()
        .map(|secret| {
            let key = secret.identicon_key();
            (key.to_string(), renderer.render(key, IDENTICON_SIZE))
        })
        .collect()
}
