//! Payout-address validation at the service boundary.

/// Validates payout addresses before they are accepted into an audit.
///
/// The core never inspects addresses; deployments inject a validator
/// matching their ledger (the reference deployment used an EIP-55
/// checksum check supplied by its web3 library).
pub trait AddressValidator: Send + Sync {
    /// Returns `true` if `candidate` is acceptable as a payout address.
    fn is_valid(&self, candidate: &str) -> bool;
}

/// Format-only validator: `0x` followed by exactly 40 hex digits.
///
/// This catches malformed input; it does not verify a mixed-case
/// checksum. Deployments wanting checksum enforcement supply their own
/// [`AddressValidator`].
#[derive(Debug, Default, Clone, Copy)]
pub struct HexAddressValidator;

impl AddressValidator for HexAddressValidator {
    fn is_valid(&self, candidate: &str) -> bool {
        let Some(digits) = candidate.strip_prefix("0x") else {
            return false;
        };
        digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_addresses_pass() {
        let validator = HexAddressValidator;
        assert!(validator.is_valid("0x52908400098527886E0F7030069857D2E4169EE7"));
        assert!(validator.is_valid(&format!("0x{}", "a".repeat(40))));
    }

    #[test]
    fn malformed_addresses_fail() {
        let validator = HexAddressValidator;
        assert!(!validator.is_valid(""));
        assert!(!validator.is_valid("52908400098527886E0F7030069857D2E4169EE7"));
        assert!(!validator.is_valid("0x123"));
        assert!(!validator.is_valid(&format!("0x{}", "g".repeat(40))));
        assert!(!validator.is_valid(&format!("0x{}", "a".repeat(41))));
    }
}
