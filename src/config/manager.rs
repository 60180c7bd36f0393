//! # 配置管理器
//!
//! 按 默认值 → TOML 文件 → 环境变量 的顺序合成最终配置

use std::env;
use std::path::{Path, PathBuf};

use super::AppConfig;
use crate::error::{Context, ProxyError, Result};
use crate::logging::{LogComponent, LogStage, mask_secret};
use crate::{ldebug, linfo};

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "TRANSLATOR_PROXY_CONFIG";

/// 配置管理器
#[derive(Debug, Default)]
pub struct ConfigManager {
    /// 配置文件路径（可选）
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// 创建配置管理器，未指定路径时读取 `TRANSLATOR_PROXY_CONFIG`
    #[must_use]
    pub fn new(config_path: Option<PathBuf>) -> Self {
        let config_path = config_path.or_else(|| {
            env::var(CONFIG_PATH_ENV)
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from)
        });
        Self { config_path }
    }

    /// 从文件与进程环境变量加载配置
    pub fn load(&self) -> Result<AppConfig> {
        self.load_with_env(env::vars())
    }

    /// 从文件与给定的环境变量集合加载配置
    pub fn load_with_env<I>(&self, vars: I) -> Result<AppConfig>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = match &self.config_path {
            Some(path) => Self::load_config_file(path)?,
            None => {
                ldebug!(
                    "system",
                    LogStage::Startup,
                    LogComponent::Config,
                    "default_config",
                    "未指定配置文件，使用默认配置"
                );
                AppConfig::default()
            }
        };

        let applied = Self::apply_env_overrides(&mut config, vars)?;
        config.validate().context("配置校验失败")?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Config,
            "config_loaded",
            "配置加载完成",
            config_file = ?self.config_path,
            env_overrides = applied,
            key_count = config.upstream.keys.len(),
            region = config.region().unwrap_or("-"),
            access_token_enabled = config.access_token().is_some()
        );
        Ok(config)
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Err(ProxyError::config(format!("配置文件不存在: {}", path.display())));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ProxyError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        toml::from_str(&content).map_err(|e| {
            ProxyError::config_with_source(
                format!("TOML解析失败 - 配置文件: {}", path.display()),
                e,
            )
        })
    }

    /// 应用环境变量覆盖，返回实际生效的覆盖数量
    ///
    /// 空值视为未设置
    fn apply_env_overrides<I>(config: &mut AppConfig, vars: I) -> Result<usize>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut applied = 0;
        for (name, value) in vars {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            let recognized = match name.as_str() {
                "AZURE_ENDPOINT" => {
                    config.upstream.endpoint = value.to_string();
                    true
                }
                "AZURE_REGION" => {
                    config.upstream.region = Some(value.to_string());
                    true
                }
                "AZURE_KEYS" => {
                    config.upstream.keys = split_keys(value);
                    true
                }
                "PROXY_TOKEN" => {
                    config.access.token = Some(value.to_string());
                    true
                }
                "PORT" => {
                    config.server.port = value.parse().map_err(|e| {
                        ProxyError::config_with_source(format!("无效的端口号: {value}"), e)
                    })?;
                    true
                }
                "HOST" => {
                    config.server.host = value.to_string();
                    true
                }
                "UPSTREAM_TIMEOUT_SECONDS" => {
                    config.upstream.timeout_seconds = value.parse().map_err(|e| {
                        ProxyError::config_with_source(format!("无效的超时时间: {value}"), e)
                    })?;
                    true
                }
                _ => false,
            };

            if recognized {
                let shown = if name.contains("KEY") || name.contains("TOKEN") {
                    mask_secret(value)
                } else {
                    value.to_string()
                };
                ldebug!(
                    "system",
                    LogStage::Startup,
                    LogComponent::Config,
                    "env_override",
                    &format!("应用环境变量覆盖: {name} = {shown}")
                );
                applied += 1;
            }
        }
        Ok(applied)
    }
}

/// 解析逗号分隔的密钥列表，去除空白与空项
#[must_use]
pub fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}
