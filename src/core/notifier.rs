//! 通知分发
//!
//! 每次提交都重新读取干部名单，为每位收件人并发发送一封通知，
//! 等全部发送结束后汇总为一个结果。

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{
    FormKind, FormStatus, FormSubmission, NotificationForm, RecipientRecord, TemplateParams,
};
use crate::errors::Result;
use crate::logger::{Sanitizer, Timer};

/// 收件人名单来源
#[async_trait]
pub trait RecipientSource: Send + Sync {
    /// 读取当前名单快照
    async fn load_recipients(&self) -> Result<Vec<RecipientRecord>>;
}

/// 邮件发送
#[async_trait]
pub trait Mailer: Send + Sync {
    /// 用指定模板发送一封邮件
    async fn send(&self, template_id: &str, params: &TemplateParams) -> Result<()>;
}

/// 两类表单使用的邮件模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub contact: String,
    pub membership: String,
}

impl Templates {
    /// 表单类型对应的模板 ID
    pub fn for_kind(&self, kind: FormKind) -> &str {
        match kind {
            FormKind::Contact => &self.contact,
            FormKind::Membership => &self.membership,
        }
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            contact: "template_gisx1yg".to_string(),
            membership: "template_4gpe6yc".to_string(),
        }
    }
}

/// 分发结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// 所有收件人均已送达
    Sent,
    /// 无可用收件人，或部分发送失败
    Partial,
    /// 名单读取失败，或所有发送失败
    Error,
}

impl From<Outcome> for FormStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Sent => FormStatus::Sent,
            Outcome::Partial => FormStatus::Partial,
            Outcome::Error => FormStatus::Error,
        }
    }
}

/// 分发报告
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotifyReport {
    pub outcome: Outcome,
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl NotifyReport {
    fn without_sends(outcome: Outcome) -> Self {
        Self {
            outcome,
            attempted: 0,
            delivered: 0,
            failed: 0,
        }
    }

    fn from_counts(delivered: usize, failed: usize) -> Self {
        let outcome = match (delivered, failed) {
            (_, 0) => Outcome::Sent,
            (0, _) => Outcome::Error,
            _ => Outcome::Partial,
        };
        Self {
            outcome,
            attempted: delivered + failed,
            delivered,
            failed,
        }
    }
}

/// 通知分发器
#[derive(Clone)]
pub struct Notifier {
    recipients: Arc<dyn RecipientSource>,
    mailer: Arc<dyn Mailer>,
    templates: Templates,
}

impl Notifier {
    pub fn new(
        recipients: Arc<dyn RecipientSource>,
        mailer: Arc<dyn Mailer>,
        templates: Templates,
    ) -> Self {
        Self {
            recipients,
            mailer,
            templates,
        }
    }

    /// 分发一次表单提交，并按结果更新提交状态
    pub async fn notify<F: NotificationForm>(
        &self,
        submission: &mut FormSubmission<F>,
    ) -> NotifyReport {
        submission.begin_sending();
        let report = self.broadcast(&submission.fields).await;
        submission.finish(report.outcome.into());
        report
    }

    async fn broadcast<F: NotificationForm>(&self, form: &F) -> NotifyReport {
        let _timer = Timer::new(format!("notify_{}", F::KIND));

        let recipients = match self.recipients.load_recipients().await {
            Ok(list) => list,
            Err(e) => {
                warn!(form = %F::KIND, error = %e, "failed to load recipients");
                return NotifyReport::without_sends(Outcome::Error);
            }
        };

        let targets: Vec<RecipientRecord> = if F::REQUIRES_ADDRESS {
            recipients.into_iter().filter(|r| r.has_address()).collect()
        } else {
            recipients
        };

        if targets.is_empty() {
            warn!(form = %F::KIND, "no recipients to notify");
            return NotifyReport::without_sends(Outcome::Partial);
        }

        let template_id = self.templates.for_kind(F::KIND);
        let sends = targets.iter().map(|recipient| {
            let params = form.template_params(&recipient.email);
            async move {
                let result = self.mailer.send(template_id, &params).await;
                if let Err(e) = &result {
                    warn!(
                        form = %F::KIND,
                        recipient = %Sanitizer::email(&recipient.email),
                        error = %e,
                        "notification failed"
                    );
                }
                result.is_ok()
            }
        });

        let results = join_all(sends).await;
        let delivered = results.iter().filter(|ok| **ok).count();
        let report = NotifyReport::from_counts(delivered, results.len() - delivered);

        info!(
            form = %F::KIND,
            delivered = report.delivered,
            failed = report.failed,
            outcome = ?report.outcome,
            "notification fan-out settled"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContactForm;
    use crate::errors::PortalError;
    use std::sync::Mutex;

    struct StaticRecipients(Result<Vec<RecipientRecord>>);

    #[async_trait]
    impl RecipientSource for StaticRecipients {
        async fn load_recipients(&self) -> Result<Vec<RecipientRecord>> {
            match &self.0 {
                Ok(list) => Ok(list.clone()),
                Err(e) => Err(PortalError::Document(e.to_string())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, TemplateParams)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, template_id: &str, params: &TemplateParams) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((template_id.to_string(), params.clone()));
            if params["email"] == "bounce@example.com" {
                return Err(PortalError::Delivery("status 422".to_string()));
            }
            Ok(())
        }
    }

    fn notifier(source: StaticRecipients, mailer: Arc<RecordingMailer>) -> Notifier {
        Notifier::new(Arc::new(source), mailer, Templates::default())
    }

    fn form() -> FormSubmission<ContactForm> {
        FormSubmission::new(ContactForm {
            full_name: "Ada".to_string(),
            objectif: "Question".to_string(),
            comment: "Hi".to_string(),
        })
    }

    #[test]
    fn test_report_aggregation() {
        assert_eq!(NotifyReport::from_counts(3, 0).outcome, Outcome::Sent);
        assert_eq!(NotifyReport::from_counts(2, 1).outcome, Outcome::Partial);
        assert_eq!(NotifyReport::from_counts(0, 3).outcome, Outcome::Error);
        assert_eq!(NotifyReport::from_counts(2, 1).attempted, 3);
    }

    #[tokio::test]
    async fn test_contact_form_sent_to_all() {
        let mailer = Arc::new(RecordingMailer::default());
        let source = StaticRecipients(Ok(vec![
            RecipientRecord::new("Chair", "Chair", "chair@example.com"),
            RecipientRecord::new("Secretary", "Secretary", "sec@example.com"),
        ]));

        let mut submission = form();
        let report = notifier(source, mailer.clone()).notify(&mut submission).await;

        assert_eq!(report.outcome, Outcome::Sent);
        assert_eq!(report.delivered, 2);
        assert_eq!(submission.status, FormStatus::Sent);
        assert_eq!(submission.fields, ContactForm::default());

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(t, p)| t == "template_gisx1yg" && p["title"] == "Ada: Question"));
    }

    #[tokio::test]
    async fn test_load_failure_is_error_without_sends() {
        let mailer = Arc::new(RecordingMailer::default());
        let source = StaticRecipients(Err(PortalError::Network("404".to_string())));

        let mut submission = form();
        let report = notifier(source, mailer.clone()).notify(&mut submission).await;

        assert_eq!(report.outcome, Outcome::Error);
        assert_eq!(report.attempted, 0);
        assert_eq!(submission.status, FormStatus::Error);
        assert_eq!(submission.fields.full_name, "Ada");
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_list_is_partial() {
        let mailer = Arc::new(RecordingMailer::default());
        let mut submission = form();
        let report = notifier(StaticRecipients(Ok(vec![])), mailer.clone())
            .notify(&mut submission)
            .await;

        assert_eq!(report.outcome, Outcome::Partial);
        assert_eq!(report.attempted, 0);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_bounce_downgrades_to_partial() {
        let mailer = Arc::new(RecordingMailer::default());
        let source = StaticRecipients(Ok(vec![
            RecipientRecord::new("Chair", "Chair", "chair@example.com"),
            RecipientRecord::new("Ghost", "Member", "bounce@example.com"),
        ]));

        let mut submission = form();
        let report = notifier(source, mailer.clone()).notify(&mut submission).await;

        assert_eq!(report.outcome, Outcome::Partial);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(submission.status, FormStatus::Partial);
        assert_eq!(submission.fields.objectif, "Question");
    }
}
