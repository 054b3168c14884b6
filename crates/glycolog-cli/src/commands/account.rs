use clap::{Args, ValueEnum};
use glycolog_core::{AccountClient, Answer, RegistrationForm, Session};

use super::store_client;

#[derive(Clone, Copy, ValueEnum)]
pub enum YesNo {
    Yes,
    No,
}

impl From<YesNo> for Answer {
    fn from(v: YesNo) -> Self {
        match v {
            YesNo::Yes => Answer::Yes,
            YesNo::No => Answer::No,
        }
    }
}

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    confirm_password: String,
    #[arg(long)]
    blood_type: String,
    #[arg(long, value_enum)]
    has_diabetes: YesNo,
    /// Required when --has-diabetes yes
    #[arg(long, default_value = "")]
    diabetes_type: String,
    #[arg(long, value_enum)]
    takes_medicine: YesNo,
    /// Required when --takes-medicine yes
    #[arg(long, default_value = "")]
    medicine_type: String,
}

impl From<RegisterArgs> for RegistrationForm {
    fn from(a: RegisterArgs) -> Self {
        RegistrationForm {
            name: a.name,
            email: a.email,
            phone: a.phone,
            password: a.password,
            confirm_password: a.confirm_password,
            blood_type: a.blood_type,
            has_diabetes: Some(a.has_diabetes.into()),
            diabetes_type: a.diabetes_type,
            takes_medicine: Some(a.takes_medicine.into()),
            medicine_type: a.medicine_type,
        }
    }
}

pub async fn login(email: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = AccountClient::new(store_client()?);
    let mut session = Session::new();
    session.log_in(client.login(email, password).await?);

    if let Some(user) = session.user() {
        println!("Welcome, {}!", user.display_name);
    }
    Ok(())
}

pub async fn register(args: RegisterArgs) -> Result<(), Box<dyn std::error::Error>> {
    let form = RegistrationForm::from(args);
    // Validate before touching the config or network.
    form.validate()?;

    let client = AccountClient::new(store_client()?);
    let mut session = Session::new();
    session.log_in(client.signup(&form).await?);
    println!("Account created, welcome {}!", form.email);
    Ok(())
}
