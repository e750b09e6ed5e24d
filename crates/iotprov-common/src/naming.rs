//! 命名规则
//!
//! 核心设备与普通设备（GGD）在注册中心、本地缓存和输出文件中使用的名称。

/// 核心设备的子名称
pub const CORE_SUB_NAME: &str = "core";

/// 普通设备子名称的保留前缀
pub const DEVICE_PREFIX: &str = "ggd_";

/// 核心设备的 thing 名称
pub fn core_thing_name(group_name: &str) -> String {
    format!("{}_Core", group_name)
}

/// 核心设备的策略名称
pub fn core_policy_name(group_name: &str) -> String {
    format!("{}_Core_Policy", group_name)
}

/// 普通设备的策略名称
pub fn device_policy_name(device_name: &str) -> String {
    format!("{}_Policy", device_name)
}

/// 区域对应的 Greengrass 服务主机名
pub fn gg_host(region: &str) -> String {
    format!("greengrass-ats.iot.{}.amazonaws.com", region)
}

/// 设备影子主题过滤器
pub fn device_shadow_topic_filter(device_thing_name: &str) -> String {
    format!("$aws/things/{}/shadow/#", device_thing_name)
}

/// 是否为核心设备
pub fn is_core(sub_name: &str) -> bool {
    sub_name == CORE_SUB_NAME
}

/// 去掉普通设备名称中的保留前缀
pub fn trim_device_prefix(sub_name: &str) -> &str {
    sub_name.strip_prefix(DEVICE_PREFIX).unwrap_or(sub_name)
}

/// 输出文件使用的设备名称：核心设备用组名，其他设备用去掉前缀的子名称
pub fn device_file_name<'a>(group_id: &'a str, sub_name: &'a str) -> &'a str {
    if is_core(sub_name) {
        group_id
    } else {
        trim_device_prefix(sub_name)
    }
}
