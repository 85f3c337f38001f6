//! Bearer-key authentication realms (§4.3, §9 "Polymorphic auth providers").
//!
//! Two independent shared secrets gate the two HTTP surfaces: the admin key
//! authorizes `/admin/*`, the nodes key authorizes the
//! `/organizations/{org}/foodtruck/nodes/{name}/*` routes. A presented key
//! is checked against exactly one realm — there is no notion of a key that
//! works for both. Comparison never takes a data-dependent amount of time,
//! closing the plain `key == admin_api_key` comparison the source system
//! flags as "probably not ok."
//!
//! The node-side concern of *which* auth provider an agent uses (bearer
//! token vs. a signed-request scheme) is out of scope here — see the design
//! note in `SPEC_FULL.md` §4.3. The server only ever needs this half.

use ring::constant_time::verify_slices_are_equal;

/// Which shared-secret realm a request is being authenticated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Realm {
    Admin,
    Nodes,
}

/// The two realm secrets, loaded once at bootstrap and shared read-only
/// across every request.
#[derive(Clone)]
pub struct Keys {
    admin: String,
    nodes: String,
}

impl Keys {
    pub fn new(admin_key: impl Into<String>, nodes_key: impl Into<String>) -> Self {
        Self {
            admin: admin_key.into(),
            nodes: nodes_key.into(),
        }
    }

    /// `true` iff `presented` matches the secret for `realm`.
    ///
    /// A length mismatch is detected (and returns `false`) before the
    /// constant-time byte comparison runs — only the byte-for-byte
    /// comparison itself needs to avoid leaking timing, since key lengths
    /// are not secret.
    pub fn verify(&self, realm: Realm, presented: &str) -> bool {
        let expected = match realm {
            Realm::Admin => &self.admin,
            Realm::Nodes => &self.nodes,
        };
        verify_slices_are_equal(expected.as_bytes(), presented.as_bytes()).is_ok()
    }
}
