use crate::peer::types::ServerConfig;
use rand::Rng;
use tracing::{info, warn};
use webrtc::ice_transport::ice_server::RTCIceServer;

pub fn random_id() -> String {
    hex::encode(rand::rng().random::<[u8; 8]>())
}

// Добавляет схему протокола к URL ICE сервера, если она отсутствует
pub fn add_ice_url_scheme(config: &ServerConfig) -> String {
    // Если схема уже есть, возвращаем как есть
    if ["turn:", "turns:", "stun:", "stuns:"]
        .iter()
        .any(|scheme| config.url.starts_with(scheme))
    {
        config.url.clone()
    } else {
        let scheme = if config.r#type == "turn" {
            "turn:"
        } else {
            "stun:"
        };
        format!("{}{}", scheme, config.url)
    }
}

/// ServerConfig -> конфигурация движка
pub fn to_ice_servers(servers: &[ServerConfig]) -> Vec<RTCIceServer> {
    servers
        .iter()
        .map(|config| RTCIceServer {
            urls: vec![add_ice_url_scheme(config)],
            username: config.username.clone().unwrap_or_default(),
            credential: config.credential.clone().unwrap_or_default(),
        })
        .collect()
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CandidateMix {
    pub host: usize,
    pub srflx: usize,
    pub relay: usize,
}

pub fn analyze_candidates(label: &str, candidates: &[String]) -> CandidateMix {
    let mut mix = CandidateMix::default();
    for candidate in candidates {
        if candidate.contains("typ host") {
            mix.host += 1;
        } else if candidate.contains("typ srflx") {
            mix.srflx += 1;
        } else if candidate.contains("typ relay") {
            mix.relay += 1;
        }
    }

    info!(
        label,
        host = mix.host,
        srflx = mix.srflx,
        relay = mix.relay,
        "candidate analysis"
    );
    if !candidates.is_empty() && mix.srflx == 0 && mix.relay == 0 {
        warn!(label, "only host candidates, connection through NAT may fail");
    }
    mix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_is_added_by_type() {
        let mut cfg = ServerConfig::stun("a", "stun.example.org:3478");
        assert_eq!(add_ice_url_scheme(&cfg), "stun:stun.example.org:3478");
        cfg.r#type = "turn".into();
        assert_eq!(add_ice_url_scheme(&cfg), "turn:stun.example.org:3478");
        cfg.url = "stun:x:1".into();
        assert_eq!(add_ice_url_scheme(&cfg), "stun:x:1");
        cfg.url = "turns:x:5349".into();
        assert_eq!(add_ice_url_scheme(&cfg), "turns:x:5349");
    }

    #[test]
    fn ice_servers_carry_credentials() {
        let cfg = ServerConfig {
            id: "t".into(),
            r#type: "turn".into(),
            url: "relay.example.org:3478".into(),
            username: Some("u".into()),
            credential: Some("p".into()),
        };
        let servers = to_ice_servers(&[cfg]);
        assert_eq!(servers[0].urls, vec!["turn:relay.example.org:3478".to_string()]);
        assert_eq!(servers[0].username, "u");
        assert_eq!(servers[0].credential, "p");
    }

    #[test]
    fn candidate_mix_counts_types() {
        let list = vec![
            "candidate:1 1 udp 2130706431 10.0.0.2 5000 typ host".to_string(),
            "candidate:2 1 udp 1694498815 198.51.100.4 6000 typ srflx raddr 10.0.0.2 rport 5000"
                .to_string(),
            "candidate:3 1 udp 16777215 203.0.113.9 7000 typ relay".to_string(),
        ];
        let mix = analyze_candidates("test", &list);
        assert_eq!(mix, CandidateMix { host: 1, srflx: 1, relay: 1 });
    }

    #[test]
    fn random_id_is_hex() {
        let id = random_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
