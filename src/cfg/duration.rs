//! 人性化时长的 serde 适配
//!
//! 配置文件中的超时写作 `"30s"`、`"500ms"`、`"1m30s"`，通过 `#[serde_as(as = "HumanDur")]` 使用。

use anyhow::{anyhow, Result};
use serde::{Deserialize, Deserializer, Serializer};
use serde_with::{DeserializeAs, SerializeAs};
use std::time::Duration;

pub use serde_with::serde_as;

/// Duration 的人性化格式化器
pub struct HumanDur;

impl SerializeAs<Duration> for HumanDur {
    fn serialize_as<S>(source: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*source))
    }
}

impl<'de> DeserializeAs<'de, Duration> for HumanDur {
    fn deserialize_as<D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// 解析 `"1m30s"` 形式的时长，支持 ms / s / m / h
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_ascii_lowercase();
    if s.is_empty() {
        return Err(anyhow!("时长为空"));
    }

    let mut total = Duration::ZERO;
    let mut rest = s.as_str();

    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| anyhow!("缺少时间单位: {}", s))?;
        if digits == 0 {
            return Err(anyhow!("期望数字: {}", s));
        }
        let value: u64 = rest[..digits].parse()?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let part = match unit {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "h" => value.checked_mul(3600).map(Duration::from_secs),
            _ => return Err(anyhow!("不支持的时间单位: {}", unit)),
        };
        total = part
            .and_then(|part| total.checked_add(part))
            .ok_or_else(|| anyhow!("时长溢出: {}", s))?;
    }

    Ok(total)
}

/// Duration 格式化为 `"1h2m3s"`，不足一秒的部分以毫秒表示
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.subsec_millis();
    let mut secs = duration.as_secs();

    if secs == 0 {
        return format!("{}ms", millis);
    }

    let mut out = String::new();
    for (unit, size) in [("h", 3600), ("m", 60)] {
        if secs >= size {
            out.push_str(&format!("{}{}", secs / size, unit));
            secs %= size;
        }
    }
    if secs > 0 {
        out.push_str(&format!("{}s", secs));
    }
    if millis > 0 {
        out.push_str(&format!("{}ms", millis));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration(" 1M30S ").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(
            parse_duration("1s250ms").unwrap(),
            Duration::from_millis(1250)
        );
    }

    #[test]
    fn test_parse_duration_errors() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("-1s").is_err());

        // 溢出返回错误而不是 panic
        assert!(parse_duration("99999999999999999h").is_err());
        assert!(parse_duration("99999999999999999m").is_err());
        assert!(parse_duration("18446744073709551615s1s").is_err());
        assert!(parse_duration("99999999999999999999s").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0ms");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1s500ms");
    }

    #[test]
    fn test_human_dur_serde() {
        #[serde_as]
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Config {
            #[serde_as(as = "Option<HumanDur>")]
            timeout: Option<Duration>,
        }

        let config: Config = serde_yaml::from_str("timeout: 45s").unwrap();
        assert_eq!(config.timeout, Some(Duration::from_secs(45)));

        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"timeout":"45s"}"#);
    }
}
