use crate::config::DEFAULT_LOG_FILTER;
use std::fmt;
use tracing::{debug, info};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::stats::StatsReportType;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Локальное время с миллисекундами
pub struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format(TIME_FORMAT))
    }
}

/// Логирование с временными метками; RUST_LOG перекрывает фильтр по умолчанию
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime)
        .with_target(false)
        .try_init();
}

/// Печать ICE-candidate при появлении (Trickle-ICE)
pub fn dump_candidate(label: &str, cand: &RTCIceCandidate) {
    if let Ok(init) = cand.to_json() {
        debug!(
            label,
            candidate = %init.candidate,
            sdp_mid = ?init.sdp_mid,
            sdp_mline_index = ?init.sdp_mline_index,
            "trickle candidate"
        );
    }
}

/// Быстрый снимок getStats → выбранная пара
pub async fn dump_selected_pair(pc: &RTCPeerConnection, moment: &str) {
    let stats = pc.get_stats().await;
    for (_, report) in stats.reports {
        if let StatsReportType::CandidatePair(pair) = report {
            if pair.nominated {
                info!(
                    moment,
                    local = %pair.local_candidate_id,
                    remote = %pair.remote_candidate_id,
                    bytes_sent = pair.bytes_sent,
                    bytes_received = pair.bytes_received,
                    state = ?pair.state,
                    "selected candidate pair"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_time_has_millisecond_precision() {
        let mut out = String::new();
        LocalTime.format_time(&mut Writer::new(&mut out)).unwrap();
        // 2024-01-31 12:34:56.789
        assert_eq!(out.len(), 23);
        assert_eq!(&out[4..5], "-");
        assert_eq!(&out[19..20], ".");
        assert!(chrono::NaiveDateTime::parse_from_str(&out, TIME_FORMAT).is_ok());
    }
}
