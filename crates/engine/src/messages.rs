//! User-facing message text. Wording lives here so the runtime stays a thin
//! action interpreter and tests can assert on stable fragments.

use mailbot_core::address::EmailAddress;

pub fn greeting(email_domain: &str) -> Vec<String> {
    vec![format!(
        "Hi there! I'm your mail bot and I'm here to help! :blush: \
         Message me and I can help you with the following:\n\
         - I can *create* your @{email_domain} email account.\n\
         - If you *forget* your email password, I can help you *reset* it.\n\
         - I can give you *information* about how to set up your emails and \
         how to access our private cloud."
    )]
}

pub fn setup_info(admin_host: &str, admin_contact: &str) -> Vec<String> {
    vec![
        "So here is some information on how to get started with your email account:".to_owned(),
        format!(
            ":mailbox_with_mail: You can access your emails via our webmail at \
             *<https://{admin_host}/mail/>*"
        ),
        format!(
            "I recommend you use an email client on your computer and/or phone. :apple: On iOS \
             and Mac you can click <https://{admin_host}/mailinabox.mobileconfig|this link> and \
             follow the instructions. Your _username_ is your full email address. Your \
             _password_ is the one I sent you when I set up your email account, unless you \
             changed it."
        ),
        "For other devices, these are the settings you will need to manually configure your \
         email client:"
            .to_owned(),
        format!(
            ">*Protocol/Method:* IMAP\n\
             >*Mail server:* {admin_host}\n\
             >*IMAP Port:* 993\n\
             >*IMAP Security:* SSL or TLS\n\
             >*SMTP Port:* 587\n\
             >*SMTP Security:* STARTTLS _(\"always\" or \"required\", if prompted)_\n\
             >*Username:* _Your full email address_\n\
             >*Password:* _The password I sent you, unless you changed it._"
        ),
        format!("For more details go to https://{admin_host}/admin and go to Mail > Instructions."),
        ":rocket: You also have access to our private cloud, which you can use for contacts, \
         calendars and file sharing/storage."
            .to_owned(),
        format!(
            "You can access it at *<https://{admin_host}/cloud>*. Your login is the same as for \
             your email account."
        ),
        format!(":question: If you have any issues I can't help you with, contact {admin_contact}. :blush:"),
    ]
}

pub fn already_have_account(email: &EmailAddress, admin_contact: &str) -> Vec<String> {
    vec![
        format!("You already have an email address: `{email}`"),
        "I can *reset* your password for you if you have forgotten it.".to_owned(),
        format!(
            "If you want to delete your account or need an alias, please contact {admin_contact}"
        ),
    ]
}

pub fn no_account_yet() -> Vec<String> {
    vec![
        "It looks like you don't have an email account yet.. :stuck_out_tongue: Ask me to \
         create one for you, then I can reset your password. :smirk:"
            .to_owned(),
    ]
}

pub fn create_intro() -> Vec<String> {
    vec![
        "Okay! I'm about to create a new email account for you.".to_owned(),
        "Are you ready?".to_owned(),
    ]
}

pub fn ask_first_name(email_domain: &str) -> Vec<String> {
    vec![
        format!(
            "Your email address will have this format: `<first name>.<last name>@{email_domain}`"
        ),
        "What is your first name?".to_owned(),
    ]
}

pub fn ask_last_name() -> String {
    "Great! What about your last name?".to_owned()
}

pub fn candidate_taken(candidate: &EmailAddress) -> Vec<String> {
    vec![
        format!("I'm sorry, but `{candidate}` is already taken! :confused:"),
        "Do you want to try again?".to_owned(),
    ]
}

pub fn confirm_candidate(candidate: &EmailAddress) -> Vec<String> {
    vec![format!("I'm about to create `{candidate}` for you!"), "Is that correct?".to_owned()]
}

pub fn offer_confirm_retry() -> String {
    "Do you want to try that again?".to_owned()
}

pub fn provisioning_started() -> String {
    "Perfect! :blush: I'll do that right now!".to_owned()
}

pub fn account_created(
    server_ack: &str,
    email: &EmailAddress,
    password: &str,
    admin_host: &str,
) -> Vec<String> {
    vec![
        format!("System says: ```{server_ack}```"),
        "All done! :sunglasses:".to_owned(),
        format!("Your new email address is: `{email}`"),
        format!("Your password is: `{password}`"),
        format!("You can change your password at https://{admin_host}/mail/"),
    ]
}

pub fn reset_intro(email: &EmailAddress) -> Vec<String> {
    vec![
        format!("I'm about to reset the password for `{email}`!"),
        "Are you sure about this?".to_owned(),
    ]
}

pub fn reset_started() -> String {
    "Okay, I'm on it! :rocket:".to_owned()
}

pub fn password_reset(server_ack: &str, password: &str, admin_host: &str) -> Vec<String> {
    vec![
        format!("System says: ```{server_ack}```"),
        "All done! :sunglasses:".to_owned(),
        format!("Your new password is: `{password}`"),
        format!("You can change your password at https://{admin_host}/mail/"),
    ]
}

pub fn failure_notice(admin_contact: &str) -> Vec<String> {
    vec!["Something went wrong! :scream:".to_owned(), format!("Please contact {admin_contact}")]
}

pub fn storage_failure_notice(admin_contact: &str) -> Vec<String> {
    vec![
        "Something went wrong with my storage! :scream:".to_owned(),
        format!("Please contact {admin_contact}"),
    ]
}

pub fn did_not_understand() -> String {
    "I didn't quite get that...".to_owned()
}

pub fn reprompts_exhausted() -> String {
    "I still didn't catch that, so I'll stop here for now. Message me again whenever you want \
     to pick this back up. :wave:"
        .to_owned()
}

pub fn decline_create() -> String {
    "Okay, I won't create a new email account.".to_owned()
}

pub fn decline_retry() -> String {
    "Later then.. You know where to find me! :wink:".to_owned()
}

pub fn decline_reset() -> String {
    "Okay, see you later. :wink:".to_owned()
}

pub fn lets_get_started() -> String {
    "Great! Let's get started! :smiley:".to_owned()
}

pub fn retry_acknowledged() -> String {
    "Okay!".to_owned()
}
