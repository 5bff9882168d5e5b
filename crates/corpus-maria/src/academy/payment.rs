//! Enrollment fee confirmation and the WhatsApp hand-off to the academy.

use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

use super::enrollment::domain::digits_only;
use super::enrollment::{format_phone, Cpf};
use super::money::Money;
use crate::config::AcademyConfig;

const WHATSAPP_BASE: &str = "https://wa.me/";
pub const PIX_PLACEHOLDER: &str = "QR Code PIX";
pub const WHATSAPP_LINK_READY: &str = "Link do WhatsApp gerado com sucesso";

/// Summary the guardian forwards to the academy after enrolling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentNotice {
    pub student_name: String,
    pub responsible_phone: String,
    pub selected_class: String,
    pub age: u32,
    pub cpf: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhatsappLink {
    pub success: bool,
    pub whatsapp_link: String,
    pub message: &'static str,
}

pub fn enrollment_message(notice: &EnrollmentNotice, fee: Money) -> String {
    let phone = match digits_only(&notice.responsible_phone) {
        digits if digits.is_empty() => notice.responsible_phone.trim().to_string(),
        digits => format_phone(&digits),
    };
    let cpf = Cpf::parse(&notice.cpf)
        .map(|cpf| cpf.formatted())
        .unwrap_or_else(|| notice.cpf.trim().to_string());

    format!(
        "🩰 *NOVA MATRÍCULA - CORPUS MARIA*\n\n\
         📝 *Dados da Aluna:*\n\
         Nome: {name}\n\
         Idade: {age} anos\n\n\
         📞 *Responsável:*\n\
         Telefone: {phone}\n\
         CPF: {cpf}\n\n\
         🎭 *Turma Matriculada:*\n\
         {class}\n\n\
         ✅ Status: Aguardando pagamento\n\
         💰 Valor: {fee}\n\n\
         ---\n\
         Matrícula realizada através do sistema online.",
        name = notice.student_name.trim(),
        age = notice.age,
        class = notice.selected_class.trim(),
    )
}

/// `https://wa.me/<phone>?text=<message>`; an empty phone lets the user pick the contact.
///
/// The text is component-encoded: spaces become `%20`, never `+`.
pub fn whatsapp_link(phone: &str, message: &str) -> Result<Url, url::ParseError> {
    let mut link = Url::parse(&format!("{WHATSAPP_BASE}{phone}"))?;
    link.set_query(Some(&format!("text={}", encode_component(message))));
    Ok(link)
}

fn encode_component(text: &str) -> String {
    // form encoding turns a literal '+' into %2B, so any '+' left is a space
    form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub fn notify_academy(
    config: &AcademyConfig,
    notice: &EnrollmentNotice,
) -> Result<WhatsappLink, url::ParseError> {
    let message = enrollment_message(notice, config.enrollment_fee);
    let link = whatsapp_link(&config.whatsapp_phone, &message)?;
    Ok(WhatsappLink {
        success: true,
        whatsapp_link: link.into(),
        message: WHATSAPP_LINK_READY,
    })
}

/// Payment instructions shown once an enrollment is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentConfirmation {
    pub enrollment_fee_cents: Money,
    pub enrollment_fee_label: String,
    pub pix: &'static str,
    pub receipt_link: String,
    pub receipt_message: String,
}

pub fn confirmation(config: &AcademyConfig) -> Result<PaymentConfirmation, url::ParseError> {
    let fee = config.enrollment_fee;
    let receipt_message = format!(
        "Olá! Gostaria de enviar o comprovante de inscrição na Academia de Balé. \
         Realizei a inscrição e estou realizando o pagamento da taxa de inscrição de {fee}."
    );
    let receipt_link = whatsapp_link("", &receipt_message)?;

    Ok(PaymentConfirmation {
        enrollment_fee_cents: fee,
        enrollment_fee_label: fee.to_string(),
        pix: PIX_PLACEHOLDER,
        receipt_link: receipt_link.into(),
        receipt_message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> EnrollmentNotice {
        EnrollmentNotice {
            student_name: "Helena Souza".to_string(),
            responsible_phone: "54999010633".to_string(),
            selected_class: "Segunda-feira, 17:30 às 18:30 (4 a 6 anos)".to_string(),
            age: 5,
            cpf: "12345678900".to_string(),
        }
    }

    #[test]
    fn message_lists_student_and_fee() {
        let message = enrollment_message(&notice(), Money::from_cents(8_000));
        assert!(message.contains("Nome: Helena Souza"));
        assert!(message.contains("Idade: 5 anos"));
        assert!(message.contains("Telefone: (54) 99901-0633"));
        assert!(message.contains("CPF: 123.456.789-00"));
        assert!(message.contains("Aguardando pagamento"));
        assert!(message.contains("Valor: R$ 80,00"));
    }

    #[test]
    fn link_targets_academy_number_with_encoded_text() {
        let config = AcademyConfig::default();
        let link = notify_academy(&config, &notice()).expect("link builds");
        assert!(link.success);
        assert!(link
            .whatsapp_link
            .starts_with(&format!("https://wa.me/{}?text=", config.whatsapp_phone)));
        assert!(!link.whatsapp_link.contains(' '));
        assert!(!link.whatsapp_link.contains('+'));
        assert!(link.whatsapp_link.contains("Helena%20Souza"));

        let parsed = Url::parse(&link.whatsapp_link).expect("valid url");
        let (_, text) = parsed
            .query_pairs()
            .find(|(key, _)| key == "text")
            .expect("text param");
        assert!(text.contains("Helena Souza"));
    }

    #[test]
    fn link_text_encodes_spaces_as_percent_twenty() {
        let link = whatsapp_link("5499910633", "Nome: Helena Souza + irmã").expect("link builds");
        assert_eq!(
            link.as_str(),
            "https://wa.me/5499910633?text=Nome%3A%20Helena%20Souza%20%2B%20irm%C3%A3"
        );
    }

    #[test]
    fn confirmation_carries_fee_and_receipt_link() {
        let confirmation = confirmation(&AcademyConfig::default()).expect("confirmation builds");
        assert_eq!(confirmation.enrollment_fee_label, "R$ 80,00");
        assert_eq!(confirmation.pix, PIX_PLACEHOLDER);
        assert!(confirmation.receipt_link.starts_with("https://wa.me/?text="));
        assert!(confirmation.receipt_message.ends_with("R$ 80,00."));
    }
}
