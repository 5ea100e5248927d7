use serde::{Deserialize, Serialize};
use time::Date;

use crate::core::time::format_primitive;
use crate::db::models::Certificate;
use crate::schemas::dates::{deserialize_option_date, format_date};

#[derive(Debug, Deserialize)]
pub(crate) struct CertificateCreate {
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    #[serde(default, deserialize_with = "deserialize_option_date")]
    pub(crate) finished_at: Option<Date>,
    #[serde(default)]
    pub(crate) qr_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CertificateListQuery {
    #[serde(default)]
    pub(crate) user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CertificateResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) finished_at: String,
    pub(crate) qr_code: String,
    pub(crate) created_at: String,
}

impl CertificateResponse {
    pub(crate) fn from_db(certificate: Certificate) -> Self {
        Self {
            id: certificate.id,
            user_id: certificate.user_id,
            course_id: certificate.course_id,
            finished_at: format_date(certificate.finished_at),
            qr_code: certificate.qr_code,
            created_at: format_primitive(certificate.created_at),
        }
    }
}
