mod issuer_tests;
mod validator_tests;
