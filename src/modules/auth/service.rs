use chemstore_core::{LocalizedError, Role, hash_password, verify_password};
use chemstore_db::users::{CreateUser, GetUserByName, StorageUser};
use chemstore_db::{BatchExecutor, ClassifiedError, classify};
use tracing::{error, info, instrument};

use crate::feedback::{FormError, FormRejection, storage_error, storage_rejection};
use crate::validator::FormValidator;

use super::model::{NewUser, SignInRequest, SignUpRequest};

pub struct AuthService;

impl AuthService {
    /// Creates an inactive `unconfirmed` account.
    #[instrument(skip_all)]
    pub async fn sign_up(
        batch: &BatchExecutor,
        validator: &FormValidator,
        request: &SignUpRequest,
    ) -> Result<StorageUser, FormRejection> {
        if request.password_1 != request.password_2 {
            info!("Passwords do not match");
            let errors = LocalizedError::single(
                "Password",
                "Паролі не співпадають",
                "Passwords do not match",
            );
            return Err(FormError::new(errors, request).into());
        }

        let new_user = NewUser::from(request);
        if let Err(errors) = validator.validate(&new_user) {
            info!(error = %errors, "Sign-up validation failed");
            return Err(FormError::new(errors, request).into());
        }

        let password_hash = hash_password(&new_user.password)?;
        let mut create = CreateUser::new(new_user.name, Role::Unconfirmed, password_hash, false);
        batch
            .perform_one(&mut create)
            .await
            .map_err(|err| storage_rejection::<StorageUser>(&err, request))?;

        create
            .user
            .ok_or_else(|| storage_error(ClassifiedError::NotFound).into())
    }

    /// Checks credentials. Every failure, whatever its cause, yields the same
    /// feedback.
    #[instrument(skip_all)]
    pub async fn sign_in(
        batch: &BatchExecutor,
        validator: &FormValidator,
        request: &SignInRequest,
    ) -> Result<StorageUser, FormRejection> {
        if let Err(errors) = validator.validate(request) {
            info!(error = %errors, "Sign-in validation failed");
            return Err(invalid_credentials(request));
        }

        let mut get = GetUserByName::new(request.name.clone());
        if let Err(err) = batch.perform_one(&mut get).await {
            return match classify(&err) {
                ClassifiedError::NotFound => {
                    info!("Not found");
                    Err(invalid_credentials(request))
                }
                other => Err(storage_error(other).into()),
            };
        }
        let Some(user) = get.user else {
            return Err(invalid_credentials(request));
        };

        match verify_password(&request.password, &user.password) {
            Ok(true) => Ok(user),
            Ok(false) => {
                info!("Invalid password");
                Err(invalid_credentials(request))
            }
            Err(err) => {
                error!(error = ?err.error, "Stored password hash is unusable");
                Err(invalid_credentials(request))
            }
        }
    }
}

fn invalid_credentials(request: &SignInRequest) -> FormRejection {
    let errors = LocalizedError::single(
        "Input",
        "Невірний логін або пароль",
        "Invalid login or password",
    );
    FormError::new(errors, request).into()
}
