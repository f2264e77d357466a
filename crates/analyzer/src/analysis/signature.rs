//! 시그니처 테이블 -- 마커 누적값을 제안 종류로 분류합니다.
//!
//! 시그니처는 `Σ count[i] * 2^i` (cscc=1, escc=2, lscc=4, qscc=8, vscc=16,
//! generateDockerfile=32)이며, [`SIGNATURE_TABLE`]에서 정확히 일치하는 값만 분류됩니다.
//! 모든 값이 정수이므로 비교는 정확 일치입니다.

use std::fmt;

use serde::Serialize;

use hyperlook_core::metrics as m;

use super::marker::CONTENT_MARKERS;

/// 제안 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// 채널 참여
    JoinChannel,
    /// 체인코드 설치
    InstallChaincode,
    /// 체인코드 인스턴스화
    InstantiateChaincode,
    /// 체인코드 업그레이드
    UpgradeChaincode,
    /// 체인코드 invoke
    Invoke,
    /// 체인코드 query
    Query,
}

/// 시그니처 → 분류 테이블
pub const SIGNATURE_TABLE: [(u64, Classification); 6] = [
    (31, Classification::JoinChannel),
    (16, Classification::InstallChaincode),
    (42, Classification::InstantiateChaincode),
    (54, Classification::UpgradeChaincode),
    (22, Classification::Invoke),
    (6, Classification::Query),
];

impl Classification {
    /// 모든 분류
    pub const ALL: [Classification; 6] = [
        Classification::JoinChannel,
        Classification::InstallChaincode,
        Classification::InstantiateChaincode,
        Classification::UpgradeChaincode,
        Classification::Invoke,
        Classification::Query,
    ];

    /// 시그니처에 해당하는 분류를 찾습니다. 테이블에 없으면 `None`.
    pub fn from_signature(signature: u64) -> Option<Self> {
        SIGNATURE_TABLE
            .iter()
            .find(|(sig, _)| *sig == signature)
            .map(|(_, classification)| *classification)
    }

    /// 분류의 시그니처 값
    pub fn signature(self) -> u64 {
        SIGNATURE_TABLE
            .iter()
            .find(|(_, classification)| *classification == self)
            .map(|(sig, _)| *sig)
            .unwrap_or_default()
    }

    /// 처리 시간을 기록할 게이지 이름
    pub fn metric_name(self) -> &'static str {
        match self {
            Self::JoinChannel => m::PEER_JOIN_CHANNEL_TIME_SECONDS,
            Self::InstallChaincode => m::PEER_INSTALL_CHAINCODE_TIME_SECONDS,
            Self::InstantiateChaincode => m::PEER_INSTANTIATE_CHAINCODE_TIME_SECONDS,
            Self::UpgradeChaincode => m::PEER_UPGRADE_CHAINCODE_TIME_SECONDS,
            Self::Invoke => m::PEER_INVOKE_CHAINCODE_TIME_SECONDS,
            Self::Query => m::PEER_QUERY_CHAINCODE_TIME_SECONDS,
        }
    }

    /// 레이블/로그용 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JoinChannel => "join_channel",
            Self::InstallChaincode => "install_chaincode",
            Self::InstantiateChaincode => "instantiate_chaincode",
            Self::UpgradeChaincode => "upgrade_chaincode",
            Self::Invoke => "invoke",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 마커 누적값의 시그니처를 계산합니다.
pub fn signature(counts: &[u32; CONTENT_MARKERS]) -> u64 {
    counts
        .iter()
        .enumerate()
        .map(|(slot, count)| u64::from(*count) << slot)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_resolve() {
        assert_eq!(
            Classification::from_signature(31),
            Some(Classification::JoinChannel)
        );
        assert_eq!(
            Classification::from_signature(16),
            Some(Classification::InstallChaincode)
        );
        assert_eq!(
            Classification::from_signature(42),
            Some(Classification::InstantiateChaincode)
        );
        assert_eq!(
            Classification::from_signature(54),
            Some(Classification::UpgradeChaincode)
        );
        assert_eq!(
            Classification::from_signature(22),
            Some(Classification::Invoke)
        );
        assert_eq!(Classification::from_signature(6), Some(Classification::Query));
    }

    #[test]
    fn unknown_signatures_are_unrecognized() {
        for sig in [0, 1, 2, 4, 10, 21, 23, 63, 1024] {
            assert_eq!(Classification::from_signature(sig), None, "signature {sig}");
        }
    }

    #[test]
    fn signatures_are_unique() {
        let mut sigs: Vec<u64> = SIGNATURE_TABLE.iter().map(|(sig, _)| *sig).collect();
        sigs.sort_unstable();
        sigs.dedup();
        assert_eq!(sigs.len(), SIGNATURE_TABLE.len());
    }

    #[test]
    fn every_classification_has_a_signature() {
        for classification in Classification::ALL {
            let sig = classification.signature();
            assert_eq!(Classification::from_signature(sig), Some(classification));
        }
    }

    #[test]
    fn signature_weights_slots_by_power_of_two() {
        assert_eq!(signature(&[1, 1, 1, 1, 1, 0]), 31);
        assert_eq!(signature(&[0, 1, 0, 1, 0, 1]), 42);
        assert_eq!(signature(&[0, 1, 1, 0, 1, 1]), 54);
        assert_eq!(signature(&[0, 0, 0, 0, 0, 0]), 0);
    }

    #[test]
    fn lscc_count_scales_its_weight() {
        // escc + lscc x3 = 2 + 12
        assert_eq!(signature(&[0, 1, 3, 0, 0, 0]), 14);
        // escc + lscc x2 = 10 -> 미인식
        let sig = signature(&[0, 1, 2, 0, 0, 0]);
        assert_eq!(sig, 10);
        assert_eq!(Classification::from_signature(sig), None);
    }

    #[test]
    fn metric_names_are_distinct() {
        let mut names: Vec<&str> = Classification::ALL.iter().map(|c| c.metric_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Classification::ALL.len());
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&Classification::InstantiateChaincode).unwrap();
        assert_eq!(json, "\"instantiate_chaincode\"");
    }
}
