use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// initData 中携带的 Telegram 用户信息
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

/// 校验 Telegram Mini App 的 initData 签名并提取用户。
///
/// 校验流程（Telegram 官方约定）:
/// 1. 解析 query string，取出 hash 字段
/// 2. 其余字段按 key 排序拼为 "k=v\n..." 作为 data-check-string
/// 3. secret = HMAC_SHA256(key="WebAppData", msg=bot_token)
/// 4. HMAC_SHA256(key=secret, msg=data_check_string) 的 hex 与 hash 比对
/// 5. auth_date 超过 max_age 秒视为重放，拒绝
pub fn validate_init_data(
    init_data: &str,
    bot_token: &str,
    max_age: i64,
    now: DateTime<Utc>,
) -> AppResult<TelegramUser> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut provided_hash: Option<String> = None;

    for part in init_data.split('&') {
        let (key, raw_value) = part
            .split_once('=')
            .ok_or_else(|| AppError::AuthError("Malformed init data".to_string()))?;
        let value = percent_decode(raw_value)
            .ok_or_else(|| AppError::AuthError("Malformed init data encoding".to_string()))?;
        if key == "hash" {
            provided_hash = Some(value);
        } else {
            pairs.push((key.to_string(), value));
        }
    }

    let provided_hash =
        provided_hash.ok_or_else(|| AppError::AuthError("Missing init data hash".to_string()))?;

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    let data_check_string = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut secret = HmacSha256::new_from_slice(b"WebAppData")
        .map_err(|_| AppError::InternalError("HMAC init failed".to_string()))?;
    secret.update(bot_token.as_bytes());
    let secret_key = secret.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret_key)
        .map_err(|_| AppError::InternalError("HMAC init failed".to_string()))?;
    mac.update(data_check_string.as_bytes());

    let expected = hex::decode(&provided_hash)
        .map_err(|_| AppError::AuthError("Invalid init data hash".to_string()))?;
    if mac.verify_slice(&expected).is_err() {
        return Err(AppError::AuthError(
            "Init data signature mismatch".to_string(),
        ));
    }

    // 时效校验
    let auth_date = pairs
        .iter()
        .find(|(k, _)| k == "auth_date")
        .and_then(|(_, v)| v.parse::<i64>().ok())
        .ok_or_else(|| AppError::AuthError("Missing auth_date".to_string()))?;
    if now.timestamp() - auth_date > max_age {
        return Err(AppError::AuthError("Init data expired".to_string()));
    }

    let user_json = pairs
        .iter()
        .find(|(k, _)| k == "user")
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| AppError::AuthError("Missing user in init data".to_string()))?;

    let user: TelegramUser = serde_json::from_str(user_json)
        .map_err(|_| AppError::AuthError("Invalid user payload in init data".to_string()))?;

    Ok(user)
}

/// URL percent 解码（initData 的 value 部分；'+' 按空格处理）
fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = (*bytes.get(i + 1)? as char).to_digit(16)?;
                let lo = (*bytes.get(i + 2)? as char).to_digit(16)?;
                out.push((hi * 16 + lo) as u8);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const BOT_TOKEN: &str = "123456:TEST-TOKEN";

    /// 用与校验端一致的算法为测试数据生成签名
    fn sign(pairs: &[(&str, &str)], bot_token: &str) -> String {
        let mut sorted: Vec<_> = pairs.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let dcs = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut secret = HmacSha256::new_from_slice(b"WebAppData").unwrap();
        secret.update(bot_token.as_bytes());
        let secret_key = secret.finalize().into_bytes();

        let mut mac = HmacSha256::new_from_slice(&secret_key).unwrap();
        mac.update(dcs.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn encode_value(v: &str) -> String {
        let mut out = String::new();
        for b in v.bytes() {
            match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    out.push(b as char)
                }
                _ => out.push_str(&format!("%{b:02X}")),
            }
        }
        out
    }

    fn build_init_data(auth_date: i64) -> String {
        let user = r#"{"id":42,"first_name":"Alice","username":"alice"}"#;
        let auth = auth_date.to_string();
        let pairs = vec![("auth_date", auth.as_str()), ("user", user)];
        let hash = sign(&pairs, BOT_TOKEN);
        format!(
            "auth_date={}&user={}&hash={}",
            auth_date,
            encode_value(user),
            hash
        )
    }

    #[test]
    fn test_valid_init_data_extracts_user() {
        let now = Utc.timestamp_opt(1_700_000_600, 0).unwrap();
        let init_data = build_init_data(1_700_000_000);
        let user = validate_init_data(&init_data, BOT_TOKEN, 86400, now).unwrap();
        assert_eq!(user.id, 42);
        assert_eq!(user.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_tampered_init_data_rejected() {
        let now = Utc.timestamp_opt(1_700_000_600, 0).unwrap();
        let init_data = build_init_data(1_700_000_000).replace("alice", "mallory");
        assert!(validate_init_data(&init_data, BOT_TOKEN, 86400, now).is_err());
    }

    #[test]
    fn test_wrong_bot_token_rejected() {
        let now = Utc.timestamp_opt(1_700_000_600, 0).unwrap();
        let init_data = build_init_data(1_700_000_000);
        assert!(validate_init_data(&init_data, "999:OTHER", 86400, now).is_err());
    }

    #[test]
    fn test_expired_init_data_rejected() {
        let now = Utc.timestamp_opt(1_700_090_000, 0).unwrap();
        let init_data = build_init_data(1_700_000_000);
        assert!(validate_init_data(&init_data, BOT_TOKEN, 86400, now).is_err());
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(
            percent_decode("%7B%22id%22%3A1%7D").as_deref(),
            Some(r#"{"id":1}"#)
        );
        assert_eq!(percent_decode("a+b").as_deref(), Some("a b"));
        assert_eq!(percent_decode("%ZZ"), None);
    }
}
