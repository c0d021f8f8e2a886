//! Round-trip properties for every ABI schema.
//!
//! `decode(encode(v)) == v` and `encode(v).len() == WIDTH` for arbitrary values.

use dstake_proto::{
    AbiCodec, Address, DecodeError, DelegationTermsBalance, DelegationTermsGeneral, GatingAsa,
    TermsPrice, TermsReqs, TermsStake, TermsTime, TermsWarn, UserInfo, UsersDll,
    USER_APP_ID_SLOTS,
};
use proptest::prelude::*;

// ════════════════════════════════════════════════════════════════════════════
// STRATEGIES
// ════════════════════════════════════════════════════════════════════════════

fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; 32]>().prop_map(Address::new)
}

fn arb_gating() -> impl Strategy<Value = GatingAsa> {
    (any::<u64>(), any::<u64>()).prop_map(|(asset_id, min_amount)| GatingAsa { asset_id, min_amount })
}

fn arb_gating_list() -> impl Strategy<Value = [GatingAsa; 2]> {
    (arb_gating(), arb_gating()).prop_map(|(a, b)| [a, b])
}

fn arb_general() -> impl Strategy<Value = DelegationTermsGeneral> {
    (
        any::<[u64; 4]>(),
        arb_address(),
        any::<[u64; 4]>(),
    )
        .prop_map(|(head, partner_address, tail)| DelegationTermsGeneral {
            commission: head[0],
            fee_round: head[1],
            fee_setup: head[2],
            fee_asset_id: head[3],
            partner_address,
            fee_round_partner: tail[0],
            fee_setup_partner: tail[1],
            rounds_setup: tail[2],
            rounds_confirm: tail[3],
        })
}

fn arb_balance() -> impl Strategy<Value = DelegationTermsBalance> {
    (any::<[u64; 3]>(), arb_gating_list()).prop_map(|(v, gating_asa_list)| DelegationTermsBalance {
        stake_max: v[0],
        cnt_breach_del_max: v[1],
        rounds_breach: v[2],
        gating_asa_list,
    })
}

fn arb_user_info() -> impl Strategy<Value = UserInfo> {
    (
        any::<[u8; 4]>(),
        any::<[u8; 8]>(),
        arb_address(),
        arb_address(),
        prop::collection::vec(any::<u64>(), USER_APP_ID_SLOTS),
        any::<u64>(),
    )
        .prop_map(|(role, dll_name, prev_user, next_user, ids, cnt_app_ids)| {
            let mut app_ids = [0u64; USER_APP_ID_SLOTS];
            app_ids.copy_from_slice(&ids);
            UserInfo {
                role,
                dll_name,
                prev_user,
                next_user,
                app_ids,
                cnt_app_ids,
            }
        })
}

fn assert_roundtrip<T: AbiCodec + PartialEq + std::fmt::Debug>(value: &T) -> Result<(), TestCaseError> {
    let bytes = value.encode();
    prop_assert_eq!(bytes.len(), T::WIDTH);
    let decoded = T::decode(&bytes).map_err(|e| TestCaseError::fail(e.to_string()))?;
    prop_assert_eq!(&decoded, value);
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// PROPERTIES
// ════════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn roundtrip_terms_time(v in any::<[u64; 5]>()) {
        assert_roundtrip(&TermsTime {
            rounds_setup: v[0],
            rounds_confirm: v[1],
            rounds_duration_min: v[2],
            rounds_duration_max: v[3],
            round_max_end: v[4],
        })?;
    }

    #[test]
    fn roundtrip_terms_price(v in any::<[u64; 5]>()) {
        assert_roundtrip(&TermsPrice {
            commission: v[0],
            fee_round_min: v[1],
            fee_round_var: v[2],
            fee_setup: v[3],
            fee_asset_id: v[4],
        })?;
    }

    #[test]
    fn roundtrip_terms_stake_warn(a in any::<u64>(), b in any::<u64>()) {
        assert_roundtrip(&TermsStake { stake_max: a, stake_gratis: b })?;
        assert_roundtrip(&TermsWarn { cnt_warning_max: a, rounds_warning: b })?;
    }

    #[test]
    fn roundtrip_terms_reqs(gating_asa_list in arb_gating_list()) {
        assert_roundtrip(&TermsReqs { gating_asa_list })?;
    }

    #[test]
    fn roundtrip_delegation_terms(general in arb_general(), balance in arb_balance()) {
        assert_roundtrip(&general)?;
        assert_roundtrip(&balance)?;
    }

    #[test]
    fn roundtrip_users_dll(cnt_users in any::<u64>(), first in arb_address(), last in arb_address()) {
        assert_roundtrip(&UsersDll { cnt_users, user_first: first, user_last: last })?;
    }

    #[test]
    fn roundtrip_user_info(user in arb_user_info()) {
        assert_roundtrip(&user)?;
    }

    #[test]
    fn roundtrip_address_text(addr in arb_address()) {
        let text = addr.to_string();
        prop_assert_eq!(text.parse::<Address>(), Ok(addr));
    }

    #[test]
    fn decode_rejects_any_other_length(len in 0usize..200) {
        prop_assume!(len != DelegationTermsGeneral::WIDTH);
        let bytes = vec![0u8; len];
        let is_invalid_length = matches!(
            DelegationTermsGeneral::decode(&bytes),
            Err(DecodeError::InvalidLength { .. })
        );
        prop_assert!(is_invalid_length);
    }
}
