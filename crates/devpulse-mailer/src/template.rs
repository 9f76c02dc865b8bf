use devpulse_core::mailer::{EmailMessage, InviteNotice};

pub const INVITE_SUBJECT: &str = "Invitation to register on ATLP DevPulse";

const FALLBACK_FIRST_NAME: &str = "ATLP";
const FALLBACK_LAST_NAME: &str = "Rwanda";
const FALLBACK_ROLE: &str = "a contributor";

/// Render the invitation email. Inviter name and role fall back to neutral
/// placeholders when the invitation does not carry them.
pub fn invite_email(notice: &InviteNotice, invite_url: &str) -> EmailMessage {
    let first = notice
        .inviter_first_name
        .as_deref()
        .unwrap_or(FALLBACK_FIRST_NAME);
    let last = notice
        .inviter_last_name
        .as_deref()
        .unwrap_or(FALLBACK_LAST_NAME);
    let role = notice.role_name.as_deref().unwrap_or(FALLBACK_ROLE);

    EmailMessage {
        subject: INVITE_SUBJECT.to_string(),
        text: format!(
            "Welcome to ATLP Rwanda\n{first} {last} is inviting you to join as {role}, \
             please click on, or copy and paste this {invite_url} into your browser's \
             address bar to accept the invite"
        ),
        html: format!(
            "<h1>Welcome to ATLP Rwanda</h1>\n<p>{first} {last} is inviting you to join \
             as {role}, please click on, or copy and paste this \
             <a href={invite_url}>{invite_url}</a> into your browser's address bar</p> \
             to accept the invite"
        ),
    }
}
