use crate::error::{Result, SignalError};
use crate::signaling::Slot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use webrtc::ice::candidate::candidate_base::unmarshal_candidate;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

/// SDP вместе с типом, формат слота: `{"type": "...", "sdp": "..."}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

pub fn encode_description(slot: Slot, desc: &SessionDescription) -> Result<String> {
    serde_json::to_string(desc).map_err(|e| SignalError::Encode {
        slot,
        reason: e.to_string(),
    })
}

/// То же описание, но полем документа
pub fn description_value(slot: Slot, desc: &SessionDescription) -> Result<Value> {
    serde_json::to_value(desc).map_err(|e| SignalError::Encode {
        slot,
        reason: e.to_string(),
    })
}

pub fn decode_description(slot: Slot, raw: &str) -> Result<SessionDescription> {
    serde_json::from_str(raw).map_err(|e| SignalError::Decode {
        slot,
        reason: e.to_string(),
    })
}

/// Один кандидат на строку, каждая строка завершается `\n`
pub fn encode_candidate_lines(candidates: &[String]) -> String {
    let mut out = String::new();
    for c in candidates {
        out.push_str(c);
        out.push('\n');
    }
    out
}

/// Разбор файла кандидатов; пустые строки пропускаются, битые - ошибка
pub fn decode_candidate_lines(slot: Slot, raw: &str) -> Result<Vec<String>> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| validate_candidate(slot, line).map(str::to_string))
        .collect()
}

/// Кандидаты в документе хранятся массивом строк
pub fn decode_candidate_array(slot: Slot, value: &Value) -> Result<Vec<String>> {
    let list: Vec<String> =
        serde_json::from_value(value.clone()).map_err(|e| SignalError::Decode {
            slot,
            reason: e.to_string(),
        })?;
    list.iter()
        .map(|c| validate_candidate(slot, c).map(str::to_string))
        .collect()
}

/// Проверка строки кандидата тем же парсером, что и у движка:
/// `candidate:<foundation> <component> <transport> <priority> <address> <port> typ <type> ...`.
/// Возвращает строку без SDP-префикса `a=`, в виде, который примет `add_ice_candidate`.
pub fn validate_candidate(slot: Slot, candidate: &str) -> Result<&str> {
    let malformed = |reason: String| SignalError::Decode {
        slot,
        reason: format!("{reason}: {candidate:?}"),
    };

    let line = candidate.strip_prefix("a=").unwrap_or(candidate);
    let body = line
        .strip_prefix("candidate:")
        .ok_or_else(|| malformed("missing candidate: prefix".into()))?;

    // седьмое поле движок пропускает не глядя
    if body.split_whitespace().nth(6) != Some("typ") {
        return Err(malformed("missing typ".into()));
    }
    unmarshal_candidate(body).map_err(|e| malformed(e.to_string()))?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "candidate:1 1 udp 2130706431 192.168.1.10 50000 typ host";
    const SRFLX: &str =
        "candidate:2 1 udp 1694498815 203.0.113.7 61000 typ srflx raddr 192.168.1.10 rport 50000";

    #[test]
    fn description_round_trip_keeps_sdp_bytes() {
        let desc = SessionDescription::offer("v=0\r\no=- 4215 2 IN IP4 127.0.0.1\r\ns=-\r\n");
        let raw = encode_description(Slot::OfferSdp, &desc).unwrap();
        assert!(raw.contains("\"type\":\"offer\""));
        let back = decode_description(Slot::OfferSdp, &raw).unwrap();
        assert_eq!(back, desc);
    }

    #[test]
    fn document_and_file_encodings_agree() {
        let desc = SessionDescription::answer("v=0\r\ns=-\r\n");
        let raw = encode_description(Slot::AnswerSdp, &desc).unwrap();
        let value = description_value(Slot::AnswerSdp, &desc).unwrap();
        assert_eq!(value, serde_json::from_str::<Value>(&raw).unwrap());
        assert_eq!(value["type"], "answer");
    }

    #[test]
    fn decode_description_rejects_garbage() {
        let err = decode_description(Slot::AnswerSdp, "{\"type\":\"pranswer\"").unwrap_err();
        assert!(matches!(err, SignalError::Decode { slot: Slot::AnswerSdp, .. }));
    }

    #[test]
    fn candidate_lines_preserve_order_and_skip_blanks() {
        let list = vec![SRFLX.to_string(), HOST.to_string()];
        let mut raw = encode_candidate_lines(&list);
        raw.push_str("\n  \n");
        assert_eq!(decode_candidate_lines(Slot::OfferCandidates, &raw).unwrap(), list);
    }

    #[test]
    fn empty_candidate_file_is_empty_list() {
        assert!(decode_candidate_lines(Slot::AnswerCandidates, "").unwrap().is_empty());
    }

    #[test]
    fn malformed_candidate_is_fatal() {
        let raw = format!("{HOST}\nnot-a-candidate\n");
        let err = decode_candidate_lines(Slot::OfferCandidates, &raw).unwrap_err();
        assert!(matches!(err, SignalError::Decode { .. }));

        let bad_port = "candidate:1 1 udp 2130706431 192.168.1.10 port typ host";
        assert!(validate_candidate(Slot::OfferCandidates, bad_port).is_err());
    }

    #[test]
    fn engine_rejected_candidates_are_fatal() {
        let bad_type = "candidate:1 1 udp 2130706431 10.0.0.1 5000 typ bogus";
        let bad_transport = "candidate:1 1 xyz 2130706431 10.0.0.1 5000 typ host";
        let bad_address = "candidate:1 1 udp 2130706431 not-an-ip 5000 typ host";
        for bad in [bad_type, bad_transport, bad_address] {
            let err = validate_candidate(Slot::OfferCandidates, bad).unwrap_err();
            assert!(matches!(err, SignalError::Decode { slot: Slot::OfferCandidates, .. }), "{bad}");
        }

        // один плохой кандидат роняет весь слот
        let value = serde_json::json!([HOST, bad_type]);
        assert!(matches!(
            decode_candidate_array(Slot::AnswerCandidates, &value),
            Err(SignalError::Decode { .. })
        ));
    }

    #[test]
    fn sdp_attribute_prefix_is_stripped() {
        let line = format!("a={HOST}");
        assert_eq!(validate_candidate(Slot::AnswerFinalCandidates, &line).unwrap(), HOST);
        let raw = format!("{line}\n");
        assert_eq!(
            decode_candidate_lines(Slot::AnswerFinalCandidates, &raw).unwrap(),
            vec![HOST.to_string()]
        );
    }

    #[test]
    fn candidate_array_round_trip() {
        let list = vec![HOST.to_string(), SRFLX.to_string()];
        let value = serde_json::to_value(&list).unwrap();
        assert_eq!(decode_candidate_array(Slot::OfferCandidates, &value).unwrap(), list);
        let bad = serde_json::json!([HOST, 42]);
        assert!(decode_candidate_array(Slot::OfferCandidates, &bad).is_err());
    }
}
