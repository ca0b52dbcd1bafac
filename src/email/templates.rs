pub fn verification_html(username: &str, verification_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Welcome to Votegate</h2>
    <p>Hi {username},</p>
    <p>We're very excited to have you on board. To verify your email, please click on the button below:</p>
    <p><a href="{verification_url}" style="display: inline-block; padding: 10px 20px; background: #22BC66; color: white; text-decoration: none; border-radius: 4px;">Verify Email</a></p>
    <p style="color: #666; font-size: 14px;">This link expires in 20 minutes. If you did not create an account, no further action is required.</p>
</body>
</html>"#
    )
}

pub fn verification_text(username: &str, verification_url: &str) -> String {
    format!(
        "Hi {username},\n\n\
         Welcome to Votegate! To verify your email, open the link below:\n\n\
         {verification_url}\n\n\
         This link expires in 20 minutes. If you did not create an account, no further action is required.\n"
    )
}

pub fn password_reset_html(username: &str, reset_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password Reset</h2>
    <p>Hi {username},</p>
    <p>You have requested to reset your password. To reset it, please click on the button below:</p>
    <p><a href="{reset_url}" style="display: inline-block; padding: 10px 20px; background: #DC4D2F; color: white; text-decoration: none; border-radius: 4px;">Reset Password</a></p>
    <p style="color: #666; font-size: 14px;">This link expires in 20 minutes. If you did not request a password reset, no further action is required.</p>
</body>
</html>"#
    )
}

pub fn password_reset_text(username: &str, reset_url: &str) -> String {
    format!(
        "Hi {username},\n\n\
         You have requested to reset your password. Open the link below to choose a new one:\n\n\
         {reset_url}\n\n\
         This link expires in 20 minutes. If you did not request a password reset, no further action is required.\n"
    )
}
