// Atomic subshell identifiers (ENDF designators)

use serde::{Deserialize, Serialize};

/// Atomic electron subshell, identified by its ENDF designator.
///
/// `Unknown` marks interactions that do not create a vacancy (coherent
/// scattering, absorption without subshell data). `Invalid` only appears
/// when converting an unrecognized designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Subshell {
    K,
    L1,
    L2,
    L3,
    M1,
    M2,
    M3,
    M4,
    M5,
    N1,
    N2,
    N3,
    N4,
    N5,
    N6,
    N7,
    O1,
    O2,
    O3,
    O4,
    O5,
    O6,
    O7,
    O8,
    O9,
    P1,
    P2,
    P3,
    P4,
    P5,
    P6,
    P7,
    P8,
    P9,
    P10,
    P11,
    Q1,
    Q2,
    Q3,
    Unknown,
    Invalid,
}

impl Subshell {
    /// Convert an ENDF subshell designator (1 = K, 2 = L1, ...) to a
    /// subshell. Unrecognized designators map to `Invalid`.
    pub fn from_endf_designator(designator: u32) -> Subshell {
        use Subshell::*;
        match designator {
            1 => K,
            2 => L1,
            3 => L2,
            4 => L3,
            5 => M1,
            6 => M2,
            7 => M3,
            8 => M4,
            9 => M5,
            10 => N1,
            11 => N2,
            12 => N3,
            13 => N4,
            14 => N5,
            15 => N6,
            16 => N7,
            17 => O1,
            18 => O2,
            19 => O3,
            20 => O4,
            21 => O5,
            22 => O6,
            23 => O7,
            24 => O8,
            25 => O9,
            26 => P1,
            27 => P2,
            28 => P3,
            29 => P4,
            30 => P5,
            31 => P6,
            32 => P7,
            33 => P8,
            34 => P9,
            35 => P10,
            36 => P11,
            37 => Q1,
            38 => Q2,
            39 => Q3,
            _ => Invalid,
        }
    }

    /// The ENDF designator, or `None` for `Unknown`/`Invalid`
    pub fn endf_designator(&self) -> Option<u32> {
        use Subshell::*;
        let d = match self {
            K => 1,
            L1 => 2,
            L2 => 3,
            L3 => 4,
            M1 => 5,
            M2 => 6,
            M3 => 7,
            M4 => 8,
            M5 => 9,
            N1 => 10,
            N2 => 11,
            N3 => 12,
            N4 => 13,
            N5 => 14,
            N6 => 15,
            N7 => 16,
            O1 => 17,
            O2 => 18,
            O3 => 19,
            O4 => 20,
            O5 => 21,
            O6 => 22,
            O7 => 23,
            O8 => 24,
            O9 => 25,
            P1 => 26,
            P2 => 27,
            P3 => 28,
            P4 => 29,
            P5 => 30,
            P6 => 31,
            P7 => 32,
            P8 => 33,
            P9 => 34,
            P10 => 35,
            P11 => 36,
            Q1 => 37,
            Q2 => 38,
            Q3 => 39,
            Unknown | Invalid => return None,
        };
        Some(d)
    }

    /// True for any physical subshell (not `Unknown` or `Invalid`)
    #[inline]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Subshell::Unknown | Subshell::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_designator_round_trip() {
        for d in 1..=39 {
            let shell = Subshell::from_endf_designator(d);
            assert!(shell.is_valid());
            assert_eq!(shell.endf_designator(), Some(d));
        }
    }

    #[test]
    fn test_unrecognized_designator() {
        assert_eq!(Subshell::from_endf_designator(0), Subshell::Invalid);
        assert_eq!(Subshell::from_endf_designator(40), Subshell::Invalid);
        assert!(!Subshell::Unknown.is_valid());
    }
}
