// src/validation.rs
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationErrors;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const OTP_LEN: usize = 6;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9+._%\-]{1,256}@[a-zA-Z0-9][a-zA-Z0-9\-]{0,64}(\.[a-zA-Z0-9][a-zA-Z0-9\-]{0,25})+$",
    )
    .expect("email pattern")
});

static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("phone pattern"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

fn check_email(errs: &mut ValidationErrors, email: &str) {
    if email.trim().is_empty() {
        errs.add("email", "Email is required");
    } else if !is_valid_email(email.trim()) {
        errs.add("email", "Please enter a valid email");
    }
}

fn check_password(errs: &mut ValidationErrors, field: &'static str, password: &str) {
    if password.trim().is_empty() {
        errs.add(field, "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errs.add(field, "Password must be at least 6 characters");
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errs = ValidationErrors::default();
    check_email(&mut errs, email);
    check_password(&mut errs, "password", password);
    errs.into_result()
}

pub fn validate_signup(form: &SignupForm) -> Result<(), ValidationErrors> {
    let mut errs = ValidationErrors::default();
    if form.name.trim().is_empty() {
        errs.add("name", "Name is required");
    }
    if form.surname.trim().is_empty() {
        errs.add("surname", "Surname is required");
    }
    check_email(&mut errs, &form.email);
    check_password(&mut errs, "password", &form.password);
    if form.password != form.confirm_password {
        errs.add("confirm_password", "Passwords do not match");
    }
    let phone = form.phone.trim();
    if !phone.is_empty() && !PHONE.is_match(phone) {
        errs.add("phone", "Invalid phone number");
    }
    errs.into_result()
}

pub fn validate_email(email: &str) -> Result<(), ValidationErrors> {
    let mut errs = ValidationErrors::default();
    check_email(&mut errs, email);
    errs.into_result()
}

pub fn validate_otp(otp: &str) -> Result<(), ValidationErrors> {
    let mut errs = ValidationErrors::default();
    if otp.len() != OTP_LEN || !otp.bytes().all(|b| b.is_ascii_digit()) {
        errs.add("otp", "OTP must be 6 digits");
    }
    errs.into_result()
}

pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), ValidationErrors> {
    let mut errs = ValidationErrors::default();
    check_password(&mut errs, "new_password", password);
    if password != confirm {
        errs.add("confirm_password", "Passwords do not match");
    }
    errs.into_result()
}
