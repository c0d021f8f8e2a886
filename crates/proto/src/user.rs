//! # User Schemas
//!
//! The noticeboard application keeps one `UserInfo` box per registered user,
//! keyed by the user's address bytes, and one `UsersDll` head per role in its
//! global state. Together they form a doubly linked list per role:
//!
//! ```text
//! UsersDll { user_first ──► UserInfo { next_user ──► UserInfo { next_user ──► 0 } } }
//! ```
//!
//! ## Invariants
//!
//! 1. `app_ids` has exactly `cnt_app_ids` non-zero entries; zero marks an
//!    empty slot and entries may be scattered.
//! 2. Walking `next_user` from `user_first` takes exactly `cnt_users` hops.

use serde::{Serialize, Serializer};

use crate::abi::{AbiCodec, AbiReader, AbiWriter};
use crate::address::Address;
use crate::error::DecodeError;
use crate::state::UserRole;

/// Slot capacity of the `app_ids` array in a `UserInfo` box.
pub const USER_APP_ID_SLOTS: usize = 110;

// ════════════════════════════════════════════════════════════════════════════
// USER INFO
// ════════════════════════════════════════════════════════════════════════════

/// Decoded `UserInfo` box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    #[serde(serialize_with = "serialize_tag")]
    pub role: [u8; 4],
    #[serde(serialize_with = "serialize_tag")]
    pub dll_name: [u8; 8],
    pub prev_user: Address,
    pub next_user: Address,
    #[serde(serialize_with = "serialize_slots")]
    pub app_ids: [u64; USER_APP_ID_SLOTS],
    pub cnt_app_ids: u64,
}

impl Default for UserInfo {
    fn default() -> Self {
        Self {
            role: [0; 4],
            dll_name: [0; 8],
            prev_user: Address::ZERO,
            next_user: Address::ZERO,
            app_ids: [0; USER_APP_ID_SLOTS],
            cnt_app_ids: 0,
        }
    }
}

impl UserInfo {
    pub fn user_role(&self) -> Option<UserRole> {
        UserRole::from_tag(&self.role)
    }

    /// Occupied slots in slot order.
    pub fn occupied_app_ids(&self) -> Vec<u64> {
        self.app_ids.iter().copied().filter(|id| *id != 0).collect()
    }

    /// Whether the non-zero slot count agrees with `cnt_app_ids`.
    pub fn app_ids_consistent(&self) -> bool {
        let occupied = self.app_ids.iter().filter(|id| **id != 0).count() as u64;
        occupied == self.cnt_app_ids
    }
}

impl AbiCodec for UserInfo {
    const NAME: &'static str = "UserInfo";
    const WIDTH: usize = 4 + 8 + 32 + 32 + 8 * USER_APP_ID_SLOTS + 8;

    fn write_to(&self, w: &mut AbiWriter) {
        self.role.write_to(w);
        self.dll_name.write_to(w);
        self.prev_user.write_to(w);
        self.next_user.write_to(w);
        self.app_ids.write_to(w);
        w.put_u64(self.cnt_app_ids);
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            role: r.read_bytes::<4>()?,
            dll_name: r.read_bytes::<8>()?,
            prev_user: Address::read_from(r)?,
            next_user: Address::read_from(r)?,
            app_ids: <[u64; USER_APP_ID_SLOTS]>::read_from(r)?,
            cnt_app_ids: r.read_u64()?,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// USERS DLL HEAD
// ════════════════════════════════════════════════════════════════════════════

/// Head of a per-role user list, stored in noticeboard global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UsersDll {
    pub cnt_users: u64,
    pub user_first: Address,
    pub user_last: Address,
}

impl AbiCodec for UsersDll {
    const NAME: &'static str = "UsersDll";
    const WIDTH: usize = 72;

    fn write_to(&self, w: &mut AbiWriter) {
        w.put_u64(self.cnt_users);
        self.user_first.write_to(w);
        self.user_last.write_to(w);
    }

    fn read_from(r: &mut AbiReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            cnt_users: r.read_u64()?,
            user_first: Address::read_from(r)?,
            user_last: Address::read_from(r)?,
        })
    }
}

fn serialize_tag<S: Serializer, const N: usize>(tag: &[u8; N], s: S) -> Result<S::Ok, S::Error> {
    let text: String = tag
        .iter()
        .take_while(|b| **b != 0)
        .map(|b| char::from(*b))
        .collect();
    s.serialize_str(&text)
}

fn serialize_slots<S: Serializer>(slots: &[u64; USER_APP_ID_SLOTS], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(slots.iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> UserInfo {
        let mut app_ids = [0u64; USER_APP_ID_SLOTS];
        app_ids[0] = 1001;
        app_ids[5] = 1002;
        app_ids[109] = 1003;
        UserInfo {
            role: UserRole::DELEGATOR_TAG,
            dll_name: *b"del\0\0\0\0\0",
            prev_user: Address::new([1; 32]),
            next_user: Address::new([2; 32]),
            app_ids,
            cnt_app_ids: 3,
        }
    }

    #[test]
    fn test_user_info_width() {
        assert_eq!(UserInfo::WIDTH, 964);
        assert_eq!(sample_user().encode().len(), 964);
    }

    #[test]
    fn test_user_info_roundtrip() {
        let user = sample_user();
        assert_eq!(UserInfo::decode(&user.encode()), Ok(user));
    }

    #[test]
    fn test_cnt_app_ids_is_last_field() {
        let bytes = sample_user().encode();
        assert_eq!(&bytes[956..964], &3u64.to_be_bytes());
    }

    #[test]
    fn test_occupied_app_ids_scattered() {
        let user = sample_user();
        assert_eq!(user.occupied_app_ids(), vec![1001, 1002, 1003]);
        assert!(user.app_ids_consistent());
        assert_eq!(user.user_role(), Some(UserRole::Delegator));
    }

    #[test]
    fn test_inconsistent_count_detected() {
        let mut user = sample_user();
        user.cnt_app_ids = 4;
        assert!(!user.app_ids_consistent());
    }

    #[test]
    fn test_users_dll_roundtrip() {
        let dll = UsersDll {
            cnt_users: 2,
            user_first: Address::new([7; 32]),
            user_last: Address::new([8; 32]),
        };
        assert_eq!(UsersDll::decode(&dll.encode()), Ok(dll));
    }

    #[test]
    fn test_serialize_role_as_text() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert_eq!(json["role"], "del");
        assert_eq!(json["app_ids"].as_array().map(|a| a.len()), Some(USER_APP_ID_SLOTS));
    }
}
