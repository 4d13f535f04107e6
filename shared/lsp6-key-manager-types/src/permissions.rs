//! LSP6 permission bits.
//!
//! Permissions are stored as a `bytes32` value under
//! `AddressPermissions:Permissions:<address>`; each bit grants one capability.

use alloy_primitives::U256;

pub const CHANGEOWNER: U256 = U256::from_limbs([0x01, 0, 0, 0]);
pub const ADDPERMISSIONS: U256 = U256::from_limbs([0x02, 0, 0, 0]);
pub const CHANGEPERMISSIONS: U256 = U256::from_limbs([0x04, 0, 0, 0]);
pub const ADDUNIVERSALRECEIVERDELEGATE: U256 = U256::from_limbs([0x20, 0, 0, 0]);
pub const CHANGEUNIVERSALRECEIVERDELEGATE: U256 = U256::from_limbs([0x40, 0, 0, 0]);
pub const SUPER_TRANSFERVALUE: U256 = U256::from_limbs([0x100, 0, 0, 0]);
pub const TRANSFERVALUE: U256 = U256::from_limbs([0x200, 0, 0, 0]);
pub const SUPER_CALL: U256 = U256::from_limbs([0x400, 0, 0, 0]);
pub const CALL: U256 = U256::from_limbs([0x800, 0, 0, 0]);
pub const SUPER_STATICCALL: U256 = U256::from_limbs([0x1000, 0, 0, 0]);
pub const STATICCALL: U256 = U256::from_limbs([0x2000, 0, 0, 0]);
pub const SUPER_DELEGATECALL: U256 = U256::from_limbs([0x4000, 0, 0, 0]);
pub const DELEGATECALL: U256 = U256::from_limbs([0x8000, 0, 0, 0]);
pub const DEPLOY: U256 = U256::from_limbs([0x10000, 0, 0, 0]);
pub const SUPER_SETDATA: U256 = U256::from_limbs([0x20000, 0, 0, 0]);
pub const SETDATA: U256 = U256::from_limbs([0x40000, 0, 0, 0]);
pub const SIGN: U256 = U256::from_limbs([0x200000, 0, 0, 0]);

/// Sentinel granting everything. Controllers holding it skip all checks.
pub const ALL_PERMISSIONS: U256 = U256::MAX;

/// Every named permission with its canonical name (as reported in `NotAuthorised`).
pub const NAMED_PERMISSIONS: [(&str, U256); 17] = [
    ("CHANGEOWNER", CHANGEOWNER),
    ("ADDPERMISSIONS", ADDPERMISSIONS),
    ("CHANGEPERMISSIONS", CHANGEPERMISSIONS),
    ("ADDUNIVERSALRECEIVERDELEGATE", ADDUNIVERSALRECEIVERDELEGATE),
    ("CHANGEUNIVERSALRECEIVERDELEGATE", CHANGEUNIVERSALRECEIVERDELEGATE),
    ("SUPER_TRANSFERVALUE", SUPER_TRANSFERVALUE),
    ("TRANSFERVALUE", TRANSFERVALUE),
    ("SUPER_CALL", SUPER_CALL),
    ("CALL", CALL),
    ("SUPER_STATICCALL", SUPER_STATICCALL),
    ("STATICCALL", STATICCALL),
    ("SUPER_DELEGATECALL", SUPER_DELEGATECALL),
    ("DELEGATECALL", DELEGATECALL),
    ("DEPLOY", DEPLOY),
    ("SUPER_SETDATA", SUPER_SETDATA),
    ("SETDATA", SETDATA),
    ("SIGN", SIGN),
];

/// Permission bitmask of a single controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Permissions(U256);

impl Permissions {
    pub const NONE: Self = Self(U256::ZERO);
    pub const ALL: Self = Self(ALL_PERMISSIONS);

    pub const fn new(bits: U256) -> Self {
        Self(bits)
    }

    /// Interpret a raw ERC725Y value. Anything that is not exactly 32 bytes reads as no permissions.
    pub fn from_data_value(value: &[u8]) -> Self {
        if value.len() != 32 {
            return Self::NONE;
        }
        Self(U256::from_be_slice(value))
    }

    pub fn bits(&self) -> U256 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_all(&self) -> bool {
        self.0 == ALL_PERMISSIONS
    }

    /// True if every bit of `permission` is set.
    pub fn has(&self, permission: U256) -> bool {
        !permission.is_zero() && self.0 & permission == permission
    }

    pub fn with(self, permission: U256) -> Self {
        Self(self.0 | permission)
    }

    pub fn without(self, permission: U256) -> Self {
        Self(self.0 & !permission)
    }

    pub fn to_data_value(&self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }
}

impl From<U256> for Permissions {
    fn from(bits: U256) -> Self {
        Self(bits)
    }
}

/// OR together a list of permission bits.
pub fn combine(permissions: &[U256]) -> U256 {
    permissions.iter().fold(U256::ZERO, |acc, p| acc | *p)
}

/// Canonical name of a single permission bit.
pub fn name_of(permission: U256) -> Option<&'static str> {
    NAMED_PERMISSIONS
        .iter()
        .find(|(_, bit)| *bit == permission)
        .map(|(name, _)| *name)
}

/// Look a permission up by its canonical name (case-insensitive).
pub fn from_name(name: &str) -> Option<U256> {
    NAMED_PERMISSIONS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, bit)| *bit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_are_distinct() {
        let all = NAMED_PERMISSIONS.iter().fold(U256::ZERO, |acc, (_, b)| {
            assert!((acc & *b).is_zero());
            acc | *b
        });
        assert_eq!(all.count_ones(), NAMED_PERMISSIONS.len());
    }

    #[test]
    fn data_value_must_be_32_bytes() {
        assert!(Permissions::from_data_value(&[0x08]).is_empty());
        let mut word = [0u8; 32];
        word[31] = 0x01;
        let p = Permissions::from_data_value(&word);
        assert!(p.has(CHANGEOWNER));
        assert!(!p.has(CALL));
    }

    #[test]
    fn has_requires_every_bit() {
        let p = Permissions::new(combine(&[CALL, TRANSFERVALUE]));
        assert!(p.has(CALL));
        assert!(p.has(CALL | TRANSFERVALUE));
        assert!(!p.has(CALL | SUPER_CALL));
        assert!(!p.has(U256::ZERO));
    }

    #[test]
    fn names_round_trip() {
        assert_eq!(name_of(SUPER_SETDATA), Some("SUPER_SETDATA"));
        assert_eq!(from_name("transfervalue"), Some(TRANSFERVALUE));
        assert_eq!(name_of(U256::from(0x08u64)), None);
    }
}
