//! JMS（AMQ）連携設定の解決

use super::types::JmsTemplate;
use crate::model::KieAppJmsObject;

const QUEUE_EXECUTOR: &str = "queue/KIE.SERVER.EXECUTOR";
const QUEUE_REQUEST: &str = "queue/KIE.SERVER.REQUEST";
const QUEUE_RESPONSE: &str = "queue/KIE.SERVER.RESPONSE";
const QUEUE_SIGNAL: &str = "queue/KIE.SERVER.SIGNAL";
const QUEUE_AUDIT: &str = "queue/KIE.SERVER.AUDIT";

/// 連携が有効な場合だけ既定値を補った設定を返す
///
/// 資格情報の既定は保存済みの AMQ ユーザー/パスワードで、再解決しても変わらない。
pub fn jms_config(
    jms: Option<&KieAppJmsObject>,
    amq_user: &str,
    amq_password: &str,
) -> JmsTemplate {
    let Some(jms) = jms.filter(|jms| jms.enable_integration) else {
        return JmsTemplate::default();
    };
    let value = |v: &Option<String>| v.clone().unwrap_or_default();
    let or_default = |v: &Option<String>, default: &str| {
        v.as_deref()
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
            .to_string()
    };

    let executor = jms.executor.unwrap_or(true);
    let queue_executor = or_default(&jms.queue_executor, QUEUE_EXECUTOR);
    let queue_request = or_default(&jms.queue_request, QUEUE_REQUEST);
    let queue_response = or_default(&jms.queue_response, QUEUE_RESPONSE);
    let queue_signal = or_default(&jms.queue_signal, QUEUE_SIGNAL);
    let queue_audit = or_default(&jms.queue_audit, QUEUE_AUDIT);

    let amq_queues = [
        (executor, &queue_executor),
        (true, &queue_request),
        (true, &queue_response),
        (jms.enable_signal, &queue_signal),
        (jms.enable_audit, &queue_audit),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .map(|(_, queue)| queue.as_str())
    .collect::<Vec<_>>()
    .join(", ");

    let ssl_settings = [
        &jms.amq_secret_name,
        &jms.amq_keystore_name,
        &jms.amq_keystore_password,
        &jms.amq_truststore_name,
        &jms.amq_truststore_password,
    ];
    let amq_enable_ssl = ssl_settings
        .iter()
        .all(|v| v.as_deref().is_some_and(|v| !v.is_empty()));

    JmsTemplate {
        enable_integration: true,
        executor,
        executor_transacted: jms.executor_transacted,
        audit_transacted: jms.audit_transacted.unwrap_or(true),
        enable_signal: jms.enable_signal,
        enable_audit: jms.enable_audit,
        queue_executor,
        queue_request,
        queue_response,
        queue_signal,
        queue_audit,
        amq_queues,
        username: or_default(&jms.username, amq_user),
        password: or_default(&jms.password, amq_password),
        amq_secret_name: value(&jms.amq_secret_name),
        amq_keystore_name: value(&jms.amq_keystore_name),
        amq_keystore_password: value(&jms.amq_keystore_password),
        amq_truststore_name: value(&jms.amq_truststore_name),
        amq_truststore_password: value(&jms.amq_truststore_password),
        amq_enable_ssl,
    }
}
