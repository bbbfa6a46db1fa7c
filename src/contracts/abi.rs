//! Solidity bindings for the validator-staking protocol contracts.

use alloy::sol;

sol! {
    /// ERC-20 stake token, including the test-network faucet `mint`.
    #[derive(Debug, PartialEq, Eq)]
    interface IStakeToken {
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function mint(address to, uint256 amount) external;
    }

    /// ERC-8004 identity registry.
    #[derive(Debug, PartialEq, Eq)]
    interface IIdentityRegistry {
        struct MetadataEntry {
            string key;
            bytes value;
        }

        function register(string tokenURI, MetadataEntry[] metadata) external returns (uint256 agentId);
        function tokenURI(uint256 tokenId) external view returns (string);
        function getMetadata(uint256 agentId, string key) external view returns (bytes);

        event Registered(uint256 indexed agentId, string tokenURI, address indexed owner);
    }

    /// ERC-8004 validation registry.
    #[derive(Debug, PartialEq, Eq)]
    interface IValidationRegistry {
        function validationRequest(address validatorAddress, uint256 agentId, string requestUri, bytes32 requestHash) external;
        function getValidationStatus(bytes32 requestHash) external view returns (
            address validatorAddress,
            uint256 agentId,
            uint8 response,
            bytes32 responseHash,
            bytes32 tag,
            uint256 lastUpdate
        );

        event ValidationRequest(address indexed validatorAddress, uint256 indexed agentId, string requestUri, bytes32 indexed requestHash);
    }

    /// Staking validator that forwards results to the validation registry.
    #[derive(Debug, PartialEq, Eq)]
    interface IStakingValidator {
        function stake(uint256 amount) external;
        function submitValidation(bytes32 requestHash, uint8 response, string responseUri, bytes32 responseHash, bytes32 tag) external;
        function claimRewards() external;
        function getValidatorInfo(address validator) external view returns (
            uint256 stake,
            bool active,
            uint256 rewards,
            uint256 validations
        );
        function getStats() external view returns (
            uint256 _totalStaked,
            uint256 _totalRewards,
            uint256 _totalSlashed
        );
    }
}
