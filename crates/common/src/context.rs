//! User session context.
//!
//! Holds the connected address and its loaded `UserInfo`. Created empty and
//! passed explicitly to whatever needs it; there is no global instance.
//!
//! | Entry point | Effect |
//! |-------------|--------|
//! | `new()` | empty: no address, no user |
//! | `connect(addr)` | sets address; drops the user if the address changed |
//! | `load_user(info)` | attaches the fetched record (ignored when disconnected) |
//! | `disconnect()` | back to empty |

use dstake_proto::{Address, UserInfo, UserRole};
use tracing::{debug, info};

use crate::error::ViewError;
use crate::rpc::ChainRpc;
use crate::view::ChainView;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSession {
    address: Option<Address>,
    user: Option<UserInfo>,
}

impl UserSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, address: Address) {
        if self.address != Some(address) {
            self.user = None;
        }
        info!(%address, "session connected");
        self.address = Some(address);
    }

    /// Attach a fetched user record. Returns `false` when no address is connected.
    pub fn load_user(&mut self, user: UserInfo) -> bool {
        if self.address.is_none() {
            debug!("load_user without a connected address, ignored");
            return false;
        }
        self.user = Some(user);
        true
    }

    pub fn disconnect(&mut self) {
        if let Some(address) = self.address.take() {
            info!(%address, "session disconnected");
        }
        self.user = None;
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    /// Role of the loaded user, if any.
    pub fn role(&self) -> Option<UserRole> {
        self.user.as_ref().and_then(UserInfo::user_role)
    }

    /// Reload the connected user's record from chain. An unregistered address
    /// leaves the session connected with no user.
    pub async fn refresh<R: ChainRpc + 'static>(
        &mut self,
        view: &ChainView<R>,
    ) -> Result<(), ViewError> {
        let Some(address) = self.address else {
            return Ok(());
        };
        self.user = view.user(&address).await?;
        debug!(%address, registered = self.user.is_some(), "session refreshed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_chain::MockChain;
    use std::sync::Arc;
    use std::time::Duration;

    fn delegator() -> UserInfo {
        UserInfo { role: UserRole::DELEGATOR_TAG, ..Default::default() }
    }

    #[test]
    fn test_new_is_empty() {
        let s = UserSession::new();
        assert!(!s.is_connected());
        assert!(s.user().is_none());
        assert!(s.role().is_none());
    }

    #[test]
    fn test_load_requires_connection() {
        let mut s = UserSession::new();
        assert!(!s.load_user(delegator()));
        assert!(s.user().is_none());

        s.connect(Address::new([1; 32]));
        assert!(s.load_user(delegator()));
        assert_eq!(s.role(), Some(UserRole::Delegator));
    }

    #[test]
    fn test_connect_other_address_drops_user() {
        let mut s = UserSession::new();
        s.connect(Address::new([1; 32]));
        s.load_user(delegator());

        s.connect(Address::new([1; 32]));
        assert!(s.user().is_some());

        s.connect(Address::new([2; 32]));
        assert!(s.user().is_none());
        assert_eq!(s.address(), Some(&Address::new([2; 32])));
    }

    #[test]
    fn test_disconnect_resets() {
        let mut s = UserSession::new();
        s.connect(Address::new([1; 32]));
        s.load_user(delegator());
        s.disconnect();
        assert_eq!(s, UserSession::new());
    }

    #[tokio::test]
    async fn test_refresh_loads_from_chain() {
        let chain = Arc::new(MockChain::new());
        let who = Address::new([8; 32]);
        chain.put_box_record(1, who.as_bytes().to_vec(), &delegator());
        let view = ChainView::with_parts(Arc::clone(&chain), 1, Duration::from_secs(2));

        let mut s = UserSession::new();
        s.refresh(&view).await.expect("noop refresh");
        assert_eq!(chain.call_counts().boxes, 0);

        s.connect(who);
        s.refresh(&view).await.expect("refresh");
        assert_eq!(s.role(), Some(UserRole::Delegator));
    }
}
